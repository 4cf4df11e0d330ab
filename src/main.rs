use std::env;

use silt::Silt;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();

    let mut silt = Silt::new();
    match args.len() {
        0 => silt.run_prompt(),
        1 => {
            let filename = args.pop().unwrap();
            silt.run_file(filename.as_ref())?;

            if silt.had_error() {
                std::process::exit(65);
            }
            if silt.had_runtime_error() {
                std::process::exit(70);
            }

            Ok(())
        }
        _ => {
            let bin_name = env!("CARGO_BIN_NAME");
            println!("Usage: {} [script]", bin_name);
            std::process::exit(64);
        }
    }
}
