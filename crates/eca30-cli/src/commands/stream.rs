use std::io::Write;

use eca30_core::Device;

use super::EngineOptions;

pub fn run(
    opts: &EngineOptions<'_>,
    format: &str,
    rate: usize,
    n_bytes: usize,
    inject_path: Option<&str>,
) {
    let device = super::make_device(opts, false);

    if let Some(path) = inject_path {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading {path}: {e}");
                std::process::exit(1);
            }
        };
        if let Err(e) = device.write(&data) {
            eprintln!("Error injecting {path}: {e}");
            std::process::exit(1);
        }
        log::info!("injected {} bytes from {path}", data.len());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    stream_to(&device, &mut out, format, rate, n_bytes);
}

/// Write `n_bytes` (0 = until the writer fails) of formatted output.
/// Returns the number of raw bytes generated.
fn stream_to<W: Write>(
    device: &Device,
    out: &mut W,
    format: &str,
    rate: usize,
    n_bytes: usize,
) -> usize {
    let chunk_size = if rate > 0 { rate.min(4096) } else { 4096 };
    let mut total = 0usize;
    let mut data = Vec::with_capacity(chunk_size);

    loop {
        if n_bytes > 0 && total >= n_bytes {
            break;
        }
        let want = if n_bytes == 0 {
            chunk_size
        } else {
            chunk_size.min(n_bytes - total)
        };

        data.clear();
        if let Err(e) = device.read_into(&mut data, want) {
            eprintln!("Error: {e}");
            break;
        }

        let write_result = match format {
            "hex" => {
                let hex: String = data.iter().map(|b| format!("{b:02x}")).collect();
                out.write_all(hex.as_bytes())
            }
            "base64" => out.write_all(base64_encode(&data).as_bytes()),
            _ => out.write_all(&data),
        };

        if write_result.is_err() {
            break; // Broken pipe
        }
        let _ = out.flush();

        total += data.len();

        if rate > 0 {
            let sleep_dur = std::time::Duration::from_secs_f64(data.len() as f64 / rate as f64);
            std::thread::sleep(sleep_dur);
        }
    }
    total
}

fn base64_encode(data: &[u8]) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        result.push(CHARS[((triple >> 18) & 0x3F) as usize] as char);
        result.push(CHARS[((triple >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            result.push(CHARS[((triple >> 6) & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
        if chunk.len() > 2 {
            result.push(CHARS[(triple & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
    }
    result
}
