use std::process::ExitCode;

use otpauth_migration::decode_otpauth_migration_url;

/// Takes migration URLs as arguments and prints one provisioning URI per
/// line. A bad input is reported on stderr and does not stop the remaining
/// inputs from being processed.
fn main() -> ExitCode {
    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("usage: otpauth-migration <otpauth-migration://offline?data=...> [...]");
        return ExitCode::FAILURE;
    }

    let mut failures = 0;
    for url in &urls {
        match decode_otpauth_migration_url(url) {
            Ok(uris) => {
                for uri in uris {
                    println!("{}", uri);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
