use super::EngineOptions;

pub fn run(opts: &EngineOptions<'_>) {
    let device = super::make_device(opts, false);
    match serde_json::to_string_pretty(&device.status()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
