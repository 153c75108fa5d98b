//! Estate totals
//!
//! Sums the declared valuations per section and derives the three
//! closing figures: total assets, total liabilities, and the net
//! estate. Amounts are pesos in `i64`; unparseable valuations count
//! as zero, matching how the row formatter passes them through.

use crate::fields::{self, Category};
use crate::format::parse_amount;
use crate::model::EstateCase;
use crate::registry::LayoutRegistry;

/// Per-section sums plus the derived estate figures, in pesos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub bienes_raices: i64,
    pub vehiculos: i64,
    pub menaje: i64,
    pub inmuebles_excluidos: i64,
    pub otros_muebles: i64,
    pub otros_bienes: i64,
    pub armas: i64,
    pub pasivos: i64,
    pub total_activos: i64,
    pub total_pasivos: i64,
    pub masa_hereditaria: i64,
}

/// Compute all totals for a case.
///
/// When the 20% legal presumption is invoked, supplied household-goods
/// items are ignored and the section total becomes one fifth of the
/// first real property's value. Firearms are always totalled for their
/// own section box; whether they join `total_activos` is registry data.
pub fn compute(case: &EstateCase, registry: &LayoutRegistry) -> Totals {
    let sum = |category: Category| -> i64 {
        fields::valuations(case, category)
            .iter()
            .map(|v| parse_amount(v))
            .sum()
    };
    let menaje = if case.presuncion_20 {
        presumed_household_total(case)
    } else {
        sum(Category::Menaje)
    };
    let mut totals = Totals {
        bienes_raices: sum(Category::BienesRaices),
        vehiculos: sum(Category::Vehiculos),
        menaje,
        inmuebles_excluidos: sum(Category::InmueblesExcluidos),
        otros_muebles: sum(Category::OtrosMuebles),
        otros_bienes: sum(Category::OtrosBienes),
        armas: sum(Category::Armas),
        pasivos: sum(Category::Pasivos),
        ..Totals::default()
    };
    totals.total_activos = totals.bienes_raices
        + totals.vehiculos
        + totals.menaje
        + totals.inmuebles_excluidos
        + totals.otros_muebles
        + totals.otros_bienes;
    if registry.include_firearms_in_assets {
        totals.total_activos += totals.armas;
    }
    totals.total_pasivos = totals.pasivos;
    // Liabilities may exceed assets; the net figure stays signed.
    totals.masa_hereditaria = totals.total_activos - totals.total_pasivos;
    totals
}

/// 20% of the first real property's declared value, rounded to the
/// peso. Zero when no real property was declared.
pub fn presumed_household_total(case: &EstateCase) -> i64 {
    case.bienes_raices
        .first()
        .map(|b| (parse_amount(&b.valoracion) as f64 * 0.20).round() as i64)
        .unwrap_or(0)
}

/// The section-box total for a category, if it has one.
pub fn section_total(totals: &Totals, category: Category) -> Option<i64> {
    match category {
        Category::Herederos => None,
        Category::BienesRaices => Some(totals.bienes_raices),
        Category::Vehiculos => Some(totals.vehiculos),
        Category::Menaje => Some(totals.menaje),
        Category::InmueblesExcluidos => Some(totals.inmuebles_excluidos),
        Category::OtrosMuebles => Some(totals.otros_muebles),
        Category::OtrosBienes => Some(totals.otros_bienes),
        Category::Armas => Some(totals.armas),
        Category::Pasivos => Some(totals.pasivos),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Firearm, HouseholdGood, Liability, RealEstate, Security, Vehicle};
    use crate::registry::LayoutRegistry;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn registry() -> LayoutRegistry {
        LayoutRegistry::builtin().clone()
    }

    fn case_with_values() -> EstateCase {
        EstateCase {
            bienes_raices: vec![
                RealEstate { valoracion: "45000000".into(), ..RealEstate::default() },
                RealEstate { valoracion: "30000000".into(), ..RealEstate::default() },
            ],
            vehiculos: vec![Vehicle { valoracion: "8000000".into(), ..Vehicle::default() }],
            menaje: vec![
                HouseholdGood { valoracion: "500000".into(), ..HouseholdGood::default() },
                HouseholdGood { valoracion: "250000".into(), ..HouseholdGood::default() },
            ],
            otros_bienes: vec![Security { valoracion: "1200000".into(), ..Security::default() }],
            armas: vec![Firearm { valoracion: "900000".into(), ..Firearm::default() }],
            pasivos: vec![Liability { valoracion: "10000000".into(), ..Liability::default() }],
            ..EstateCase::default()
        }
    }

    #[test]
    fn sums_each_section_and_derives_the_estate() {
        let totals = compute(&case_with_values(), &registry());
        assert_eq!(totals.bienes_raices, 75_000_000);
        assert_eq!(totals.vehiculos, 8_000_000);
        assert_eq!(totals.menaje, 750_000);
        assert_eq!(totals.otros_bienes, 1_200_000);
        assert_eq!(totals.armas, 900_000);
        // Firearms stay out of the asset total by default.
        assert_eq!(totals.total_activos, 84_950_000);
        assert_eq!(totals.total_pasivos, 10_000_000);
        assert_eq!(totals.masa_hereditaria, 74_950_000);
    }

    #[test]
    fn registry_flag_pulls_firearms_into_assets() {
        let mut reg = registry();
        reg.include_firearms_in_assets = true;
        let totals = compute(&case_with_values(), &reg);
        assert_eq!(totals.total_activos, 84_950_000 + 900_000);
    }

    #[test]
    fn presumption_replaces_supplied_household_goods() {
        let mut case = case_with_values();
        case.presuncion_20 = true;
        case.bienes_raices[0].valoracion = "100000000".into();
        let totals = compute(&case, &registry());
        assert_eq!(totals.menaje, 20_000_000);
        // 100M + 30M realty, 8M vehicles, 20M presumed, 1.2M securities.
        assert_eq!(totals.total_activos, 159_200_000);
    }

    #[test]
    fn presumption_without_real_estate_is_zero() {
        let case = EstateCase {
            presuncion_20: true,
            menaje: vec![HouseholdGood { valoracion: "500000".into(), ..Default::default() }],
            ..EstateCase::default()
        };
        let totals = compute(&case, &registry());
        assert_eq!(totals.menaje, 0);
        assert_eq!(totals.total_activos, 0);
    }

    #[test]
    fn unparseable_valuations_count_as_zero() {
        let case = EstateCase {
            vehiculos: vec![
                Vehicle { valoracion: "12 UF".into(), ..Vehicle::default() },
                Vehicle { valoracion: "3000000".into(), ..Vehicle::default() },
            ],
            ..EstateCase::default()
        };
        let totals = compute(&case, &registry());
        assert_eq!(totals.vehiculos, 3_000_000);
    }

    #[test]
    fn net_estate_goes_negative_when_debts_dominate() {
        let case = EstateCase {
            menaje: vec![HouseholdGood { valoracion: "100".into(), ..Default::default() }],
            pasivos: vec![Liability { valoracion: "5000".into(), ..Default::default() }],
            ..EstateCase::default()
        };
        let totals = compute(&case, &registry());
        assert_eq!(totals.masa_hereditaria, -4_900);
    }

    proptest! {
        #[test]
        fn asset_total_matches_analytic_sum(
            values in proptest::collection::vec(0i64..1_000_000_000, 0..20)
        ) {
            let case = EstateCase {
                otros_muebles: values
                    .iter()
                    .map(|v| crate::model::OtherMovable {
                        valoracion: v.to_string(),
                        ..Default::default()
                    })
                    .collect(),
                ..EstateCase::default()
            };
            let totals = compute(&case, &registry());
            prop_assert_eq!(totals.otros_muebles, values.iter().sum::<i64>());
            prop_assert_eq!(totals.total_activos, totals.otros_muebles);
            prop_assert_eq!(totals.masa_hereditaria, totals.total_activos);
        }
    }
}
