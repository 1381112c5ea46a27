mod model;
pub mod style;

pub use model::{
    build_report, Block, Cell, Narrative, ReportDocument, Row, RowKind, Section, SectionKind,
    SignatureBlock, Table, TextLine,
};
