use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use passaudit_core::CrackedCredential;
use tracing::warn;

/// Writes the cracked credentials CSV.
///
/// A write failure is logged as a warning and nothing more: the cracking
/// results are already computed and reported, and losing the file does not
/// invalidate them.
pub fn write_cracked_csv(path: &Path, cracked: &[CrackedCredential]) {
    match try_write(path, cracked) {
        Ok(()) => println!("Cracked password details have been written to {}", path.display()),
        Err(err) => {
            warn!(path = %path.display(), %err, "could not write the cracked credentials CSV");
        }
    }
}

fn try_write(path: &Path, cracked: &[CrackedCredential]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_rows(&mut writer, cracked)?;
    writer.flush()
}

/// Fields are comma-joined without escaping; an embedded comma in a password
/// is a known limitation of the format.
fn write_rows<W: Write>(writer: &mut W, cracked: &[CrackedCredential]) -> io::Result<()> {
    writeln!(writer, "user_name,hashed_password,plain_password")?;

    for credential in cracked {
        writeln!(
            writer,
            "{},{},{}",
            credential.username, credential.hashed_password, credential.plain_password
        )?;
    }

    Ok(())
}
