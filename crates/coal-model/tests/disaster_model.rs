use std::collections::BTreeMap;

use coal_core::{CoalError, RngHandle, Value};
use coal_graph::{NetworkState, Undo};
use coal_mcmc::SamplerConfig;
use coal_model::{DisasterData, SwitchpointModel};

/// Counts averaging 3.0 before 1900 and 0.9 from 1900 through 1962.
fn synthetic_data() -> DisasterData {
    let mut counts = BTreeMap::new();
    for year in 1851..1900 {
        counts.insert(year, 3);
    }
    for year in 1900..=1962 {
        counts.insert(year, if (year - 1900) % 10 == 9 { 0 } else { 1 });
    }
    DisasterData {
        start_year: 1851,
        end_year: 1962,
        counts,
    }
}

#[test]
fn every_year_in_the_inclusive_range_is_observed() {
    let model = SwitchpointModel::new(&synthetic_data()).unwrap();
    let network = model.network().unwrap();
    assert_eq!(network.observed_vertices().len(), 112);
    assert_eq!(network.latent_vertices().len(), 3);
    assert_eq!(model.observations().first().unwrap().year, 1851);
    assert_eq!(model.observations().last().unwrap().year, 1962);
    assert_eq!(model.graph().find_label("count_1962"), Some(model.observations()[111].count));
}

#[test]
fn recovers_the_switch_year_of_synthetic_counts() {
    let model = SwitchpointModel::new(&synthetic_data()).unwrap();
    let config = SamplerConfig::default();
    let posterior = model.run(&config).unwrap();

    assert!(
        (posterior.switch_year - 1900).abs() <= 5,
        "switch year {}",
        posterior.switch_year
    );
    assert!(posterior.early_rate_mean > posterior.late_rate_mean);
    assert_eq!(posterior.summary.iterations, 50_000);
    assert_eq!(posterior.summary.retained, 9_800);
}

#[test]
fn same_seed_gives_the_same_posterior() {
    let model = SwitchpointModel::new(&synthetic_data()).unwrap();
    let mut config = SamplerConfig::default();
    config.num_samples = 5_000;
    config.seed_policy.master_seed = 7;
    let a = model.run(&config).unwrap();
    let b = model.run(&config).unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
}

#[test]
fn single_year_dataset_assembles_with_one_observation() {
    let data = DisasterData {
        start_year: 1900,
        end_year: 1900,
        counts: BTreeMap::from([(1900, 2)]),
    };
    let model = SwitchpointModel::new(&data).unwrap();
    let network = model.network().unwrap();
    assert_eq!(network.observed_vertices().len(), 1);

    let mut config = SamplerConfig::default();
    config.num_samples = 2_000;
    config.burn_in = 100;
    let posterior = model.run(&config).unwrap();
    assert_eq!(posterior.switch_year, 1900);
}

#[test]
fn missing_year_is_a_data_error() {
    let mut data = synthetic_data();
    data.counts.remove(&1910);
    let err = SwitchpointModel::new(&data).unwrap_err();
    match err {
        CoalError::Data(info) => {
            assert_eq!(info.code, "missing-year");
            assert_eq!(info.context.get("year").map(String::as_str), Some("1910"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn inverted_range_is_a_data_error() {
    let data = DisasterData {
        start_year: 1962,
        end_year: 1851,
        counts: BTreeMap::new(),
    };
    assert_eq!(SwitchpointModel::new(&data).unwrap_err().code(), "inverted-range");
}

#[test]
fn switch_year_itself_uses_the_late_rate() {
    let data = DisasterData {
        start_year: 2000,
        end_year: 2002,
        counts: BTreeMap::from([(2000, 1), (2001, 1), (2002, 1)]),
    };
    let model = SwitchpointModel::new(&data).unwrap();
    let network = model.network().unwrap();
    let mut state = NetworkState::initialise(&network, &mut RngHandle::from_seed(3)).unwrap();
    let mut undo = Undo::new();
    state
        .apply(&network, model.switchpoint(), Value::Int(2001), &mut undo)
        .unwrap();

    let early = state.value(model.early_rate()).unwrap();
    let late = state.value(model.late_rate()).unwrap();
    let rates: Vec<Value> = model
        .observations()
        .iter()
        .map(|obs| state.value(obs.rate).unwrap())
        .collect();
    assert_eq!(rates, vec![early, late, late]);
}
