//! Shared test fixtures: keyed records that remember how they were merged.

use std::convert::Infallible;

use crate::strategy::{FnStrategy, MergeStrategy, Merged};

/// How the last merge touched a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Fresh,
    Same,
    Added,
    Removed,
}

/// A target record. `serial` stands in for object identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    pub key: String,
    pub serial: u32,
    pub status: Status,
}

/// Split a whitespace-separated list of keys.
pub fn keys(listing: &str) -> Vec<String> {
    listing.split_whitespace().map(str::to_string).collect()
}

/// Records with serials `1..=n` in listing order.
pub fn records(listing: &str) -> Vec<Record> {
    listing
        .split_whitespace()
        .zip(1..)
        .map(|(key, serial)| Record {
            key: key.to_string(),
            serial,
            status: Status::Fresh,
        })
        .collect()
}

pub fn keys_of<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<&'a str> {
    records.into_iter().map(|r| r.key.as_str()).collect()
}

pub fn statuses(records: &[Record]) -> Vec<Status> {
    records.iter().map(|r| r.status).collect()
}

/// The merge behind [`tagging`] and [`tombstoning`]. Created records take
/// serials counting up from `next`.
pub fn tag(
    source: Option<&String>,
    target: Option<&mut Record>,
    next: &mut u32,
    tombstone: bool,
) -> Merged<Record> {
    match (source, target) {
        (Some(_), Some(existing)) => {
            existing.status = Status::Same;
            Merged::Retain
        }
        (Some(key), None) => {
            *next += 1;
            Merged::Replace(Record {
                key: key.clone(),
                serial: *next,
                status: Status::Added,
            })
        }
        (None, Some(existing)) if tombstone => {
            existing.status = Status::Removed;
            Merged::Retain
        }
        (None, _) => Merged::Discard,
    }
}

/// Match by key. Created records get serials above 1000 and unmatched
/// targets are discarded.
pub fn tagging() -> impl MergeStrategy<String, Record, Error = Infallible> {
    let mut next = 1000;
    FnStrategy::new(
        |s: &String, t: &Record| *s == t.key,
        move |s: Option<&String>, t: Option<&mut Record>| tag(s, t, &mut next, false),
    )
}

/// Like [`tagging`], but unmatched targets survive with `Status::Removed`.
pub fn tombstoning() -> impl MergeStrategy<String, Record, Error = Infallible> {
    let mut next = 1000;
    FnStrategy::new(
        |s: &String, t: &Record| *s == t.key,
        move |s: Option<&String>, t: Option<&mut Record>| tag(s, t, &mut next, true),
    )
}

/// Fails whenever it is asked to merge the key `boom`.
pub struct Exploding;

impl MergeStrategy<String, Record> for Exploding {
    type Error = String;

    fn matches(&mut self, source: &String, target: &Record) -> Result<bool, String> {
        Ok(*source == target.key)
    }

    fn merge(
        &mut self,
        source: Option<&String>,
        target: Option<&mut Record>,
    ) -> Result<Merged<Record>, String> {
        match (source, target) {
            (Some(key), _) if key == "boom" => Err(format!("cannot merge {key}")),
            (Some(_), Some(_)) => Ok(Merged::Retain),
            (Some(key), None) => Ok(Merged::Replace(Record {
                key: key.clone(),
                serial: 0,
                status: Status::Added,
            })),
            (None, _) => Ok(Merged::Discard),
        }
    }
}
