use cc_params::ParameterSet;
use cc_proxy::{StepOutput, StepSeriesBuilder, derive_proxies};
use proptest::prelude::*;

fn step(pairs: &[(&str, f64)]) -> StepOutput {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn base(ca: f64, mg: f64, r14c: f64, d18o: f64) -> StepOutput {
    step(&[
        ("Ca(mol/kgw)", ca),
        ("C(mol/kgw)", 2.0 * ca),
        ("mass_H2O", 1.0),
        ("Mg(mol/kgw)", mg),
        ("Sr(mol/kgw)", 1.0e-6),
        ("Ba(mol/kgw)", 1.0e-7),
        ("U(mol/kgw)", 1.0e-6),
        ("I_R(14C)", r14c),
        ("I_R(18O)_Calcite", d18o),
    ])
}

#[test]
fn builder_output_feeds_derivation() {
    let mut b = StepSeriesBuilder::new();
    b.push("dissolve_bedrock", &base(4.0e-3, 4.0e-4, 100.0, -999.0));
    b.push("degas_1", &base(4.0e-3, 4.0e-4, 95.0, -999.0));
    b.push("CaCO3_precipitation_1", &base(3.5e-3, 3.9e-4, 95.1, 26.0));
    b.push("CaCO3_precipitation_2", &base(3.0e-3, 3.8e-4, 94.9, -1000.0));
    let mut series = b.build().expect("equal-length series");

    let params = ParameterSet::new(3).with("precipitate_mineralogy", "Calcite");
    derive_proxies(&mut series, &params).expect("derivation failed");

    let r14c = series.get("R14C").expect("R14C present");
    assert_eq!(&r14c[1..], &[Some(95.0), Some(95.0), Some(95.0)]);
    assert!((series.value("DCP", 1).unwrap() - 5.0).abs() < 1e-12);

    assert_eq!(series.value("d18O_Calcite", 3), None);
    assert_eq!(series.value("d18O_PDB", 3), None);
    assert!(series.value("d18O_PDB", 2).is_some());

    for (key, values) in series.iter() {
        assert_eq!(values.len(), 4, "{key}");
        for v in values.iter().flatten() {
            assert!(v.is_finite() && *v > -999.0, "{key} kept {v}");
        }
    }
}

#[test]
fn sentinel_boundary_after_derivation() {
    let mut b = StepSeriesBuilder::new();
    let mut first = base(4.0e-3, 4.0e-4, 100.0, 0.0);
    first.insert("si_Calcite".to_string(), -998.0);
    first.insert("si_Aragonite".to_string(), -999.0);
    b.push("dissolve_bedrock", &first);
    b.push("degas_1", &base(4.0e-3, 4.0e-4, 95.0, 0.0));
    let mut series = b.build().unwrap();

    derive_proxies(&mut series, &calcite()).unwrap();
    assert_eq!(series.value("si_Calcite", 0), Some(-998.0));
    assert_eq!(series.value("si_Aragonite", 0), None);
}

fn calcite() -> ParameterSet {
    ParameterSet::new(0).with("precipitate_mineralogy", "Calcite")
}

proptest! {
    #[test]
    fn ratios_stay_finite_for_flat_calcium(ca in 0.0f64..1.0e-2, mg in 0.0f64..1.0e-3) {
        let mut b = StepSeriesBuilder::new();
        b.push("dissolve_bedrock", &base(ca, mg, 100.0, 0.0));
        b.push("CaCO3_precipitation_1", &base(ca, mg * 0.9, 100.0, 0.0));
        b.push("CaCO3_precipitation_2", &base(0.0, 0.0, 100.0, 0.0));
        let mut series = b.build().unwrap();
        derive_proxies(&mut series, &calcite()).unwrap();

        prop_assert_eq!(series.value("Mg/Ca(mol/mol)_Calcite", 1), Some(0.0));
        prop_assert_eq!(series.value("Mg/Ca(mol/mol)", 2), Some(0.0));
        for (_, values) in series.iter() {
            for v in values.iter().flatten() {
                prop_assert!(v.is_finite());
            }
        }
    }
}
