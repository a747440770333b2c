use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use passaudit_core::User;
use tracing::warn;

/// Loads the users file. An unreadable file is logged and treated as an
/// empty user set rather than aborting the run.
pub fn load_users(path: &Path) -> Vec<User> {
    match File::open(path) {
        Ok(file) => parse_users(BufReader::new(file)),
        Err(err) => {
            warn!(path = %path.display(), %err, "unable to read the users file, continuing with no users");
            Vec::new()
        }
    }
}

/// Parses `username,hashedPasswordHex` records.
///
/// Lines with fewer than two fields are skipped silently, fields beyond the
/// second are ignored, the digest is trimmed, and duplicate usernames
/// collapse to their last occurrence.
fn parse_users<R: BufRead>(reader: R) -> Vec<User> {
    let mut users: HashMap<String, User> = HashMap::new();

    for line in reader.lines().map_while(Result::ok) {
        let mut fields = line.split(',');
        let (Some(username), Some(digest)) = (fields.next(), fields.next()) else {
            continue;
        };

        let digest = digest.trim();
        if digest.is_empty() {
            continue;
        }

        users.insert(username.to_string(), User::new(username, digest));
    }

    users.into_values().collect()
}

/// Loads the dictionary file, one candidate plaintext per line, skipping
/// blank lines. An unreadable file is logged and treated as empty.
pub fn load_dictionary(path: &Path) -> Vec<String> {
    match File::open(path) {
        Ok(file) => parse_dictionary(BufReader::new(file)),
        Err(err) => {
            warn!(path = %path.display(), %err, "unable to read the dictionary file, continuing with no words");
            Vec::new()
        }
    }
}

fn parse_dictionary<R: BufRead>(reader: R) -> Vec<String> {
    reader
        .lines()
        .map_while(Result::ok)
        .filter(|line| !line.trim().is_empty())
        .collect()
}
