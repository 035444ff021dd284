use std::io::Write;

use super::EngineOptions;

pub fn run(opts: &EngineOptions<'_>, path: &str, buffer_size: usize) {
    let device = super::make_device(opts, false);
    let buffer_size = if buffer_size > 0 { buffer_size } else { 4096 };

    // Create FIFO if it doesn't exist; verify it's a FIFO if it does.
    if std::path::Path::new(path).exists() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            let is_fifo = std::fs::metadata(path)
                .map(|meta| meta.file_type().is_fifo())
                .unwrap_or(false);
            if !is_fifo {
                eprintln!("Error: {path} exists and is not a FIFO.");
                std::process::exit(1);
            }
        }
    } else {
        #[cfg(unix)]
        {
            use std::ffi::CString;
            let Ok(c_path) = CString::new(path) else {
                eprintln!("Error: {path} contains a NUL byte.");
                std::process::exit(1);
            };
            // SAFETY: c_path is a valid NUL-terminated CString.
            let ret = unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) };
            if ret != 0 {
                eprintln!("Error creating FIFO: {}", std::io::Error::last_os_error());
                std::process::exit(1);
            }
            println!("Created FIFO: {path}");
        }
        #[cfg(not(unix))]
        {
            eprintln!("Named pipes not supported on this platform.");
            std::process::exit(1);
        }
    }

    let status = device.status();
    println!(
        "Feeding Rule 30 output to {path} (bootstrap={}, block={}B, buffer={buffer_size}B)",
        status.bootstrap, status.block_size
    );
    println!("Press Ctrl+C to stop.");

    install_cleanup_handler(path);

    // A reader closing its end is not fatal: reopen and wait for the next one.
    loop {
        match std::fs::OpenOptions::new().write(true).open(path) {
            Ok(mut fifo) => loop {
                match device.read_into(&mut fifo, buffer_size) {
                    Ok(_) => {
                        let _ = fifo.flush();
                    }
                    Err(eca30_core::Error::Transfer { delivered, .. }) => {
                        log::debug!("reader closed {path} after {delivered} bytes of a block");
                        break;
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                        let _ = std::fs::remove_file(path);
                        std::process::exit(1);
                    }
                }
            },
            Err(e) => {
                eprintln!("Error opening FIFO: {e}");
                break;
            }
        }
    }

    let _ = std::fs::remove_file(path);
}

/// Store the FIFO path globally so the signal handler can clean it up.
static FIFO_PATH: std::sync::OnceLock<String> = std::sync::OnceLock::new();

/// Register a signal handler that removes the FIFO on Ctrl+C / SIGTERM.
fn install_cleanup_handler(path: &str) {
    let _ = FIFO_PATH.set(path.to_string());
    // SAFETY: signal() registers a C-linkage handler for SIGINT/SIGTERM.
    // signal_handler is a valid extern "C" fn with correct signature.
    unsafe {
        libc::signal(
            libc::SIGINT,
            signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGTERM,
            signal_handler as *const () as libc::sighandler_t,
        );
    }
}

extern "C" fn signal_handler(_: libc::c_int) {
    if let Some(path) = FIFO_PATH.get() {
        let _ = std::fs::remove_file(path);
    }
    std::process::exit(0);
}
