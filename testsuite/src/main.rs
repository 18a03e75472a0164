use arp_testsuite::evaluator::evaluate_fixtures;
use arp_testsuite::report::TestOutcome;
use std::env;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Expecting one argument: <fixtures_directory>");
        return ExitCode::FAILURE;
    }

    match evaluate_fixtures(Path::new(&args[1])) {
        Ok(results) => {
            let mut failures = 0;
            for result in results {
                if let TestOutcome::Failed { .. } = result.outcome {
                    failures += 1;
                }
                println!("{}", result);
            }
            if failures == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
