use renogy_modbus::prelude::*;

fn main() {
    let options = Options::new();

    if let Err(e) = renogy_modbus::app(options) {
        eprintln!("Error: {:#}", e);
        std::process::exit(255);
    }
}
