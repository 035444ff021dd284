use super::EngineOptions;

pub fn run(opts: &EngineOptions<'_>, host: &str, port: u16, read_only: bool) {
    let device = super::make_device(opts, read_only);

    let base = format!("http://{host}:{port}");
    let status = device.status();

    println!("eca30 server v{}", eca30_core::VERSION);
    println!("   {base}");
    println!(
        "   {}-cell Rule 30 ring, bootstrap={}, block={}B",
        status.width_bits, status.bootstrap, status.block_size
    );
    println!();
    println!("   Endpoints:");
    println!("     GET  /                 API index (try: curl {base})");
    println!("     GET  /api/v1/random    Random bytes from the automaton");
    if read_only {
        println!("     POST /api/v1/entropy   (disabled: --read-only)");
    } else {
        println!("     POST /api/v1/entropy   Mix the request body into the pool");
    }
    println!("     GET  /health           Pool health check");
    println!("     GET  /pool/status      Engine counters and settings");
    println!();
    println!("   Query params for /api/v1/random:");
    println!("     length=N              Bytes to return (1-65536, default: 1024)");
    println!("     type=hex16|uint8|uint16|hex  Output format (default: hex16)");
    println!();
    println!("   Examples:");
    println!("     curl {base}/api/v1/random?length=32&type=uint8");
    println!("     curl --data-binary @noise.bin {base}/api/v1/entropy");
    println!("     curl {base}/pool/status");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(eca30_server::run_server(device, host, port)) {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
