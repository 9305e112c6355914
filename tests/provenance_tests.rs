//! Provenance records: registration asymmetry and run queries

mod test_data_gen;

use provflow_core::run::PipelineRun;
use provflow_exec::{record_step, record_step_with_ids};
use test_data_gen::{cities, people, people_deduped};

#[test]
fn test_inputs_dedupe_outputs_do_not() {
    let mut run = PipelineRun::new();
    let p = run.registry_mut().register(&people()).unwrap();

    let first = record_step(&mut run, "dedup", &[&people()], &[&people_deduped()]).unwrap();
    let second = record_step(&mut run, "dedup again", &[&people()], &[&people_deduped()]).unwrap();

    assert_eq!(first.input_datasets, vec![p.clone()]);
    assert_eq!(second.input_datasets, vec![p]);
    assert_eq!(first.output_datasets, second.output_datasets);
    // people once, deduped output twice.
    assert_eq!(run.registry().len(), 3);
    assert_eq!(run.dataset_ids().len(), 3);
}

#[test]
fn test_steps_are_appended_in_order_with_context() {
    let mut run = PipelineRun::new();
    let a = record_step(&mut run, "first", &[&people()], &[&people_deduped()]).unwrap();
    let b = record_step(&mut run, "second", &[&people_deduped(), &cities()], &[&cities()]).unwrap();

    let ids: Vec<_> = run.steps().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);

    let order: Vec<_> = run.context().iter().map(|(id, _)| *id).collect();
    assert_eq!(order, ids);

    let entry = run.context().get(&b.id).unwrap();
    assert_eq!(entry.input_schemas.len(), 2);
    let names = entry.input_schemas[1].as_ref().unwrap().column_names();
    assert_eq!(names, vec!["person", "city"]);
}

#[test]
fn test_lineage_queries() {
    let mut run = PipelineRun::new();
    let a = record_step(&mut run, "first", &[&people()], &[&people_deduped()]).unwrap();
    let b = record_step(&mut run, "second", &[&people_deduped()], &[&cities()]).unwrap();
    let middle = a.output_datasets[0].clone();

    let producers: Vec<_> = run.steps_producing(&middle).map(|s| s.id).collect();
    let consumers: Vec<_> = run.steps_consuming(&middle).map(|s| s.id).collect();
    assert_eq!(producers, vec![a.id]);
    assert_eq!(consumers, vec![b.id]);
    assert_eq!(run.step(&b.id).unwrap().description, "second");
}

#[test]
fn test_record_with_known_ids() {
    let mut run = PipelineRun::new();
    let p = run.registry_mut().register(&people()).unwrap();
    let d = run.registry_mut().register_new(&people_deduped()).unwrap();
    let step = record_step_with_ids(&mut run, "manual", vec![p.clone()], vec![d.clone()]).unwrap();
    assert!(step.consumes(&p));
    assert!(step.produces(&d));
    assert_eq!(run.registry().len(), 2);
}
