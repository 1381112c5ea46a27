use serde::Serialize;

use crate::config::UnitInput;

/// One apartment after the fixed expenses have been split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    pub id: String,
    pub occupied: bool,
    pub rateio: f64,
    pub taxa: f64,
    /// Surplus (positive) or deficit (negative): taxa - rateio
    pub caixa: f64,
}

/// Result of splitting the fixed expenses across the occupied units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub occupied_count: usize,
    pub rateio_per_unit: f64,
    pub units: Vec<Unit>,
    pub subtotal_rateio: f64,
    pub subtotal_taxa: f64,
    pub subtotal_caixa: f64,
}

/// Split `total_fixed_expenses` equally across the occupied units.
///
/// With no occupied unit the share is 0.0. Units keep the order they were
/// given in, which is also the order they are printed in.
pub fn allocate(total_fixed_expenses: f64, units: &[UnitInput]) -> Allocation {
    let occupied_count = units.iter().filter(|u| u.occupied).count();
    let rateio_per_unit = if occupied_count > 0 {
        total_fixed_expenses / occupied_count as f64
    } else {
        0.0
    };

    let mut subtotal_rateio = 0.0;
    let mut subtotal_taxa = 0.0;
    let mut subtotal_caixa = 0.0;

    let units: Vec<Unit> = units
        .iter()
        .map(|input| {
            let (rateio, taxa, caixa) = if input.occupied {
                (rateio_per_unit, input.taxa, input.taxa - rateio_per_unit)
            } else {
                (0.0, 0.0, 0.0)
            };

            subtotal_rateio += rateio;
            subtotal_taxa += taxa;
            subtotal_caixa += caixa;

            Unit {
                id: input.id.clone(),
                occupied: input.occupied,
                rateio,
                taxa,
                caixa,
            }
        })
        .collect();

    Allocation {
        occupied_count,
        rateio_per_unit,
        units,
        subtotal_rateio,
        subtotal_taxa,
        subtotal_caixa,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, occupied: bool, taxa: f64) -> UnitInput {
        UnitInput {
            id: id.to_string(),
            occupied,
            taxa,
        }
    }

    #[test]
    fn test_equal_share_across_occupied_units() {
        let units = vec![
            unit("101", true, 120.0),
            unit("102", false, 0.0),
            unit("201", true, 100.0),
            unit("202", false, 0.0),
            unit("301", true, 100.0),
        ];

        let allocation = allocate(300.0, &units);

        assert_eq!(allocation.occupied_count, 3);
        assert_eq!(allocation.rateio_per_unit, 100.0);
        assert_eq!(allocation.units[0].caixa, 20.0);
        assert_eq!(allocation.units[0].rateio, 100.0);

        let vacant = &allocation.units[1];
        assert!(!vacant.occupied);
        assert_eq!((vacant.rateio, vacant.taxa, vacant.caixa), (0.0, 0.0, 0.0));

        assert_eq!(allocation.subtotal_rateio, 300.0);
        assert_eq!(allocation.subtotal_taxa, 320.0);
        assert_eq!(allocation.subtotal_caixa, 20.0);
    }

    #[test]
    fn test_no_occupied_units_gives_zero_share() {
        let units = vec![unit("101", false, 50.0), unit("102", false, 0.0)];
        let allocation = allocate(300.0, &units);

        assert_eq!(allocation.occupied_count, 0);
        assert_eq!(allocation.rateio_per_unit, 0.0);
        assert!(allocation.units.iter().all(|u| u.taxa == 0.0 && u.caixa == 0.0));
        assert_eq!(allocation.subtotal_rateio, 0.0);
    }

    #[test]
    fn test_vacant_unit_taxa_is_ignored() {
        let allocation = allocate(100.0, &[unit("101", true, 60.0), unit("102", false, 999.0)]);
        assert_eq!(allocation.units[1].taxa, 0.0);
        assert_eq!(allocation.subtotal_taxa, 60.0);
    }

    #[test]
    fn test_unit_order_is_preserved() {
        let allocation = allocate(
            0.0,
            &[unit("302", true, 1.0), unit("101", true, 2.0), unit("201", false, 0.0)],
        );
        let ids: Vec<_> = allocation.units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["302", "101", "201"]);
    }

    #[test]
    fn test_deficit_unit_has_negative_caixa() {
        let allocation = allocate(200.0, &[unit("101", true, 50.0), unit("102", true, 150.0)]);
        assert_eq!(allocation.units[0].caixa, -50.0);
        assert_eq!(allocation.units[1].caixa, 50.0);
        assert_eq!(allocation.subtotal_caixa, 0.0);
    }
}
