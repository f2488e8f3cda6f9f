//! Terminal-device queries. These live beside the other filesystem
//! primitives because they operate on an already-open file descriptor
//! (stdout, typically) rather than rendering anything themselves — the
//! host surface exposes the raw ioctl and leaves presentation decisions
//! to the excluded renderer.

use crate::error::Error;

#[cfg(unix)]
#[allow(unsafe_code)]
pub fn terminal_width(fd: i32) -> Result<u32, Error> {
    use std::io;
    // SAFETY: `winsize` is a plain-old-data struct and `ioctl` with
    // `TIOCGWINSZ` only ever writes into it; `fd` is caller-supplied and
    // validated by the syscall itself.
    unsafe {
        let mut ws: libc::winsize = std::mem::zeroed();
        if libc::ioctl(fd, libc::TIOCGWINSZ, std::ptr::addr_of_mut!(ws)) != 0 {
            return Err(Error::io("tcwidth", "<fd>", io::Error::last_os_error()));
        }
        Ok(u32::from(ws.ws_col))
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
pub fn terminal_flush(fd: i32) -> Result<(), Error> {
    use std::io;
    // SAFETY: `fd` is caller-supplied; `tcflush` validates it itself.
    let rc = unsafe { libc::tcflush(fd, libc::TCIOFLUSH) };
    if rc != 0 {
        return Err(Error::io("tcflush", "<fd>", io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(windows)]
pub fn terminal_width(_fd: i32) -> Result<u32, Error> {
    // Windows exposes the equivalent information via
    // `GetConsoleScreenBufferInfo`, which needs a real console handle
    // rather than a raw fd; callers on Windows are expected to fall back
    // to this default when unavailable.
    Ok(80)
}

#[cfg(windows)]
pub fn terminal_flush(_fd: i32) -> Result<(), Error> {
    Ok(())
}
