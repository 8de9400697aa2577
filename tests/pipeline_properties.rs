use gradeflow::pipeline::{GradingConfiguration, GradingContext, Pipeline};
use gradeflow_test_utils::recording::{Behaviour, Journal, RecordingStep};
use proptest::prelude::*;

fn behaviour_strategy() -> impl Strategy<Value = Behaviour> {
    prop_oneof![
        6 => Just(Behaviour::Succeed),
        1 => Just(Behaviour::Warn),
        1 => Just(Behaviour::Fail),
    ]
}

fn run_blocking(pipeline: &Pipeline) -> i32 {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let configuration = GradingConfiguration::new("https://github.com/prop/test", "ws");
    runtime.block_on(pipeline.run(&configuration, GradingContext::new))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cleanups_mirror_successful_steps(behaviours in prop::collection::vec(behaviour_strategy(), 0..12)) {
        let journal = Journal::new();
        let mut pipeline = Pipeline::new();
        for (index, behaviour) in behaviours.iter().enumerate() {
            let name = format!("s{index}");
            pipeline = pipeline.add_step(name.clone(), RecordingStep::new(&name, &journal, *behaviour));
        }

        let exit_code = run_blocking(&pipeline);

        let first_failure = behaviours.iter().position(|b| *b != Behaviour::Succeed);
        let succeeded = first_failure.unwrap_or(behaviours.len());
        let expected_runs: Vec<String> = (0..first_failure.map_or(succeeded, |i| i + 1))
            .map(|i| format!("s{i}"))
            .collect();
        let expected_closes: Vec<String> = (0..succeeded).rev().map(|i| format!("s{i}")).collect();

        prop_assert_eq!(exit_code, if first_failure.is_some() { 1 } else { 0 });
        prop_assert_eq!(journal.with_prefix("run:"), expected_runs);
        prop_assert_eq!(journal.with_prefix("close:"), expected_closes);
    }
}
