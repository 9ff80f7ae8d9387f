use radon_multilevel::{
    BindingError, DataValue, RadonData, RadonModel, SimulationConfig, simulate_radon,
};

fn table() -> RadonData {
    simulate_radon(&SimulationConfig::default()).expect("default simulation is valid")
}

#[test]
fn every_model_binding_matches_its_declarations() {
    let data = table();
    for model in RadonModel::ALL {
        let spec = model.spec();
        let binding = model.bind(&data).expect("simulated table binds");
        assert_eq!(binding.validate_against(&spec), Ok(()), "{model}");
    }
}

#[test]
fn bound_county_codes_lie_in_one_to_j() {
    let data = table();
    let binding = RadonModel::VaryingInterceptSlope
        .bind(&data)
        .expect("simulated table binds");
    let Some(DataValue::IntArray(codes)) = binding.get("county") else {
        panic!("county must be bound as an integer array");
    };
    let j = i64::try_from(data.n_counties()).expect("small county count");
    assert!(codes.iter().all(|code| (1..=j).contains(code)));
    assert_eq!(codes.len(), data.n_obs());
}

#[test]
fn tampered_binding_is_rejected() {
    let data = table();
    let spec = RadonModel::Unpooled.spec();
    let mut binding = RadonModel::Unpooled.bind(&data).expect("simulated table binds");
    binding.insert_int("N", 3);
    assert!(matches!(
        binding.validate_against(&spec),
        Err(BindingError::LengthMismatch { .. })
    ));
}

#[test]
fn rendered_specifications_have_three_blocks() {
    for model in RadonModel::ALL {
        let text = model.spec().render();
        for block in ["data {", "parameters {", "model {"] {
            assert!(text.contains(block), "{model} is missing `{block}`");
        }
    }
}
