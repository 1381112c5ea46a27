use serde::Serialize;

use super::style::{self, Align, Font, Rgb};
use crate::config::{Identification, ReportSettings};
use crate::statement::{format_money, ExtraItemBlock, Statement};

const TABLE_WIDTH: f32 = 150.0;
const ROW_HEIGHT: f32 = 6.0;
const HEADER_ROW_HEIGHT: f32 = 7.0;
const SECTION_GAP: f32 = 4.0;

const VACANT: &str = "Desocupado";
const NO_EXTRA_EXPENSES: &str = "Nenhuma despesa extra.";
const NO_EXTRA_INCOME: &str = "Nenhuma receita extra.";

/// The whole statement as ordered, page-independent sections
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub author: Option<String>,
    /// Text repeated at the top of every page after the first
    pub running_header: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Masthead,
    Identification,
    Units,
    Expenses,
    ExtraExpenses,
    ExtraIncome,
    Summary,
    Signature,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Block {
    Text(TextLine),
    Table(Table),
    Narrative(Narrative),
    Signature(SignatureBlock),
    Space(f32),
}

#[derive(Debug, Clone, Serialize)]
pub struct TextLine {
    pub text: String,
    pub font: Font,
    pub color: Rgb,
    pub align: Align,
    pub height: f32,
}

/// Columns plus rows; centered horizontally by the renderer
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub columns: Vec<f32>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.columns.iter().sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
    pub fill: Rgb,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Header,
    Data,
    Total,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    pub text: String,
    /// Number of columns covered
    pub span: usize,
    pub align: Align,
    pub font: Font,
    pub color: Rgb,
}

impl Cell {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: 1,
            align: Align::Left,
            font: Font::regular(10.0),
            color: style::BLACK,
        }
    }

    fn money(value: f64, currency_symbol: &str) -> Self {
        Self {
            text: format_money(value, currency_symbol),
            span: 1,
            align: Align::Right,
            font: Font::regular(10.0),
            color: style::money_color(value),
        }
    }

    fn header(text: impl Into<String>, align: Align) -> Self {
        Self {
            text: text.into(),
            span: 1,
            align,
            font: Font::bold(10.0),
            color: style::WHITE,
        }
    }

    fn bold(mut self) -> Self {
        self.font.bold = true;
        self
    }
}

/// Free text, wrapped by the renderer
#[derive(Debug, Clone, Serialize)]
pub struct Narrative {
    pub text: String,
    pub width: f32,
    pub font: Font,
    pub color: Rgb,
    pub line_height: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureBlock {
    pub name: String,
    pub caption: String,
    pub line_width: f32,
}

/// Assemble the statement layout. Pure: same statement, same document.
pub fn build_report(
    statement: &Statement,
    settings: &ReportSettings,
    subtitle: Option<&str>,
) -> ReportDocument {
    let symbol = settings.currency_symbol.as_str();
    let id = &statement.identification;

    let sections = vec![
        masthead(&settings.title, subtitle),
        identification(id),
        units_table(statement, symbol),
        expenses_table(statement, symbol),
        extra_block(
            SectionKind::ExtraExpenses,
            "Despesas Extras",
            "Total Despesas Extras",
            &statement.extra_expenses,
            NO_EXTRA_EXPENSES,
            symbol,
        ),
        extra_block(
            SectionKind::ExtraIncome,
            "Receitas Extras",
            "Total Receitas Extras",
            &statement.extra_income,
            NO_EXTRA_INCOME,
            symbol,
        ),
        summary(statement, symbol),
        signature(&statement.signer),
    ];

    ReportDocument {
        title: format!("{} - Bloco {} - {}", settings.title, id.bloco, id.period),
        author: (!statement.signer.is_empty()).then(|| statement.signer.clone()),
        running_header: running_header(id),
        sections,
    }
}

fn running_header(id: &Identification) -> String {
    format!(
        "Quadra {} | Bloco {} | Mês/Ano {}",
        id.quadra, id.bloco, id.period
    )
}

fn masthead(title: &str, subtitle: Option<&str>) -> Section {
    let mut blocks = vec![Block::Text(TextLine {
        text: title.to_string(),
        font: Font::bold(16.0),
        color: style::BLUE,
        align: Align::Center,
        height: 10.0,
    })];

    if let Some(subtitle) = subtitle.filter(|s| !s.trim().is_empty()) {
        blocks.push(Block::Text(TextLine {
            text: subtitle.trim().to_string(),
            font: Font::regular(11.0),
            color: style::MUTED,
            align: Align::Center,
            height: 6.0,
        }));
    }
    blocks.push(Block::Space(SECTION_GAP));

    Section {
        kind: SectionKind::Masthead,
        heading: None,
        blocks,
    }
}

fn identification(id: &Identification) -> Section {
    let field = |label: &str, value: &str| Cell {
        align: Align::Center,
        ..Cell::text(format!("{label}: {value}"))
    };

    let row = Row {
        kind: RowKind::Data,
        cells: vec![
            field("Quadra", &id.quadra).bold(),
            field("Bloco", &id.bloco).bold(),
            field("Mês/Ano", &id.period).bold(),
        ],
        fill: style::HIGHLIGHT,
        height: HEADER_ROW_HEIGHT,
    };

    Section {
        kind: SectionKind::Identification,
        heading: None,
        blocks: vec![
            Block::Table(Table {
                columns: vec![TABLE_WIDTH / 3.0; 3],
                rows: vec![row],
            }),
            Block::Space(SECTION_GAP),
        ],
    }
}

fn header_row(titles: &[(&str, Align)]) -> Row {
    Row {
        kind: RowKind::Header,
        cells: titles
            .iter()
            .map(|(title, align)| Cell::header(*title, *align))
            .collect(),
        fill: style::BLUE,
        height: HEADER_ROW_HEIGHT,
    }
}

fn total_row(cells: Vec<Cell>) -> Row {
    Row {
        kind: RowKind::Total,
        cells: cells.into_iter().map(Cell::bold).collect(),
        fill: style::HIGHLIGHT,
        height: ROW_HEIGHT,
    }
}

fn units_table(statement: &Statement, symbol: &str) -> Section {
    let allocation = &statement.allocation;
    let mut rows = vec![header_row(&[
        ("Apto", Align::Left),
        ("Rateio", Align::Right),
        ("Taxa", Align::Right),
        ("Caixa", Align::Right),
    ])];

    for (index, unit) in allocation.units.iter().enumerate() {
        let cells = if unit.occupied {
            vec![
                Cell::text(&unit.id),
                Cell::money(unit.rateio, symbol),
                Cell::money(unit.taxa, symbol),
                Cell::money(unit.caixa, symbol),
            ]
        } else {
            vec![
                Cell::text(&unit.id),
                Cell {
                    span: 3,
                    align: Align::Center,
                    font: Font::italic(10.0),
                    color: style::MUTED,
                    ..Cell::text(VACANT)
                },
            ]
        };

        rows.push(Row {
            kind: RowKind::Data,
            cells,
            fill: style::zebra(index),
            height: ROW_HEIGHT,
        });
    }

    rows.push(total_row(vec![
        Cell::text("Subtotal"),
        Cell::money(allocation.subtotal_rateio, symbol),
        Cell::money(allocation.subtotal_taxa, symbol),
        Cell::money(allocation.subtotal_caixa, symbol),
    ]));

    Section {
        kind: SectionKind::Units,
        heading: Some("Receitas".to_string()),
        blocks: vec![
            Block::Table(Table {
                columns: vec![30.0, 40.0, 40.0, 40.0],
                rows,
            }),
            Block::Space(SECTION_GAP),
        ],
    }
}

fn expenses_table(statement: &Statement, symbol: &str) -> Section {
    let mut rows = vec![header_row(&[("Despesa", Align::Left), ("Valor", Align::Right)])];

    for (index, expense) in statement.expenses.iter().enumerate() {
        rows.push(Row {
            kind: RowKind::Data,
            cells: vec![Cell::text(&expense.name), Cell::money(expense.value, symbol)],
            fill: style::zebra(index),
            height: ROW_HEIGHT,
        });
    }

    rows.push(total_row(vec![
        Cell::text("Total Despesas"),
        Cell::money(statement.totals.total_fixed_expenses, symbol),
    ]));

    Section {
        kind: SectionKind::Expenses,
        heading: Some("Despesas".to_string()),
        blocks: vec![
            Block::Table(Table {
                columns: vec![100.0, 50.0],
                rows,
            }),
            Block::Space(SECTION_GAP),
        ],
    }
}

fn extra_block(
    kind: SectionKind,
    heading: &str,
    total_label: &str,
    block: &ExtraItemBlock,
    placeholder: &str,
    symbol: &str,
) -> Section {
    let narrative = if block.is_empty() {
        Narrative {
            text: placeholder.to_string(),
            width: TABLE_WIDTH,
            font: Font::italic(10.0),
            color: style::MUTED,
            line_height: 6.0,
        }
    } else {
        Narrative {
            text: block.text.clone(),
            width: TABLE_WIDTH,
            font: Font::regular(10.0),
            color: style::BLACK,
            line_height: 6.0,
        }
    };

    Section {
        kind,
        heading: Some(heading.to_string()),
        blocks: vec![
            Block::Narrative(narrative),
            Block::Table(Table {
                columns: vec![100.0, 50.0],
                rows: vec![total_row(vec![
                    Cell::text(total_label),
                    Cell::money(block.total, symbol),
                ])],
            }),
            Block::Space(SECTION_GAP),
        ],
    }
}

fn summary(statement: &Statement, symbol: &str) -> Section {
    let totals = &statement.totals;
    let lines = [
        ("Total Taxas Arrecadadas", totals.subtotal_taxa),
        ("Total Despesas", totals.total_fixed_expenses),
        ("Total Despesas Extras", totals.extra_expense_total),
        ("Total Receitas Extras", totals.extra_income_total),
        ("Saldo Anterior", totals.prior_balance),
    ];

    let mut rows: Vec<Row> = lines
        .iter()
        .enumerate()
        .map(|(index, (label, value))| Row {
            kind: RowKind::Data,
            cells: vec![Cell::text(*label), Cell::money(*value, symbol)],
            fill: style::zebra(index),
            height: ROW_HEIGHT,
        })
        .collect();

    rows.push(total_row(vec![
        Cell::text("Saldo Atual"),
        Cell::money(totals.current_balance, symbol),
    ]));

    Section {
        kind: SectionKind::Summary,
        heading: Some("Resumo Final".to_string()),
        blocks: vec![
            Block::Table(Table {
                columns: vec![100.0, 50.0],
                rows,
            }),
            Block::Space(SECTION_GAP),
        ],
    }
}

fn signature(signer: &str) -> Section {
    Section {
        kind: SectionKind::Signature,
        heading: None,
        blocks: vec![Block::Signature(SignatureBlock {
            name: signer.to_string(),
            caption: "Responsável".to_string(),
            line_width: 80.0,
        })],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::tests::scenario_input;

    fn scenario_report() -> ReportDocument {
        let statement = Statement::compute(&scenario_input());
        build_report(&statement, &ReportSettings::default(), None)
    }

    fn table_of(section: &Section) -> &Table {
        section
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_sections_in_order() {
        let kinds: Vec<_> = scenario_report().sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [
                SectionKind::Masthead,
                SectionKind::Identification,
                SectionKind::Units,
                SectionKind::Expenses,
                SectionKind::ExtraExpenses,
                SectionKind::ExtraIncome,
                SectionKind::Summary,
                SectionKind::Signature,
            ]
        );
    }

    #[test]
    fn test_identification_fields() {
        let report = scenario_report();
        let row = &table_of(&report.sections[1]).rows[0];
        let texts: Vec<_> = row.cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["Quadra: C", "Bloco: 11A", "Mês/Ano: nov./25"]);
        assert_eq!(report.running_header, "Quadra C | Bloco 11A | Mês/Ano nov./25");
    }

    #[test]
    fn test_unit_table_rows() {
        let report = scenario_report();
        let table = table_of(&report.sections[2]);

        // header + 6 units + subtotal
        assert_eq!(table.rows.len(), 8);
        assert_eq!(table.rows[0].kind, RowKind::Header);
        assert_eq!(table.rows[7].kind, RowKind::Total);
        assert_eq!(table.rows[7].fill, style::HIGHLIGHT);

        let occupied = &table.rows[1];
        assert_eq!(occupied.cells.len(), 4);
        assert_eq!(occupied.cells[1].text, "R$ 50.00");
        assert_eq!(occupied.cells[3].text, "R$ 30.00");
        assert_eq!(occupied.cells[3].align, Align::Right);

        // unit 201 is vacant
        let vacant = &table.rows[3];
        assert_eq!(vacant.cells.len(), 2);
        assert_eq!(vacant.cells[1].span, 3);
        assert_eq!(vacant.cells[1].text, VACANT);

        let subtotal: Vec<_> = table.rows[7].cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(subtotal, ["Subtotal", "R$ 200.00", "R$ 320.00", "R$ 120.00"]);
    }

    #[test]
    fn test_zebra_striping_alternates() {
        let report = scenario_report();
        let table = table_of(&report.sections[2]);
        let fills: Vec<_> = table.rows[1..7].iter().map(|r| r.fill).collect();
        assert_eq!(
            fills,
            [style::WHITE, style::ZEBRA, style::WHITE, style::ZEBRA, style::WHITE, style::ZEBRA]
        );
    }

    #[test]
    fn test_every_row_spans_the_table() {
        let report = scenario_report();
        for section in &report.sections {
            for block in &section.blocks {
                if let Block::Table(table) = block {
                    for row in &table.rows {
                        let span: usize = row.cells.iter().map(|c| c.span).sum();
                        assert_eq!(span, table.columns.len());
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_extra_block_shows_placeholder() {
        let mut input = scenario_input();
        input.extra_income = "nada".to_string();
        let statement = Statement::compute(&input);
        let report = build_report(&statement, &ReportSettings::default(), None);

        let narrative = report.sections[5]
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Narrative(n) => Some(n),
                _ => None,
            })
            .unwrap();
        assert_eq!(narrative.text, NO_EXTRA_INCOME);
        assert!(narrative.font.italic);

        let total = &table_of(&report.sections[5]).rows[0];
        assert_eq!(total.cells[1].text, "R$ 0.00");
    }

    #[test]
    fn test_negative_balance_uses_warning_color() {
        let mut input = scenario_input();
        input.expenses[0].value = 1000.0;
        let statement = Statement::compute(&input);
        let report = build_report(&statement, &ReportSettings::default(), None);

        let summary = table_of(&report.sections[6]);
        let balance = summary.rows.last().unwrap();
        assert_eq!(balance.cells[0].text, "Saldo Atual");
        assert_eq!(balance.cells[1].color, style::WARNING);

        // each occupied unit now owes more than it paid
        let units = table_of(&report.sections[2]);
        assert_eq!(units.rows[1].cells[3].color, style::WARNING);
    }

    #[test]
    fn test_masthead_subtitle_and_metadata() {
        let statement = Statement::compute(&scenario_input());
        let report = build_report(
            &statement,
            &ReportSettings::default(),
            Some("Residencial Flores"),
        );
        assert_eq!(report.sections[0].blocks.len(), 3);
        assert_eq!(report.author.as_deref(), Some("Maria Souza"));
        assert_eq!(report.title, "Prestação de Contas - Bloco 11A - nov./25");
    }
}
