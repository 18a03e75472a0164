use arp_testsuite::evaluator::evaluate_fixtures;
use arp_testsuite::report::TestOutcome;
use std::error::Error;
use std::path::PathBuf;

#[test]
fn fixtures() -> Result<(), Box<dyn Error>> {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.push("tests");
    dir.push("fixtures");

    let results = evaluate_fixtures(&dir)?;
    assert!(results.len() >= 20, "only {} fixtures found", results.len());

    let mut errors = Vec::default();
    for result in results {
        if let TestOutcome::Failed { .. } = result.outcome {
            errors.push(result.to_string())
        }
    }
    assert!(errors.is_empty(), "\n{}\n", errors.join("\n"));
    Ok(())
}
