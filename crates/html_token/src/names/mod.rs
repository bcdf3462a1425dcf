//! Case-insensitive name interner.
//!
//! Known names live in a table sorted by hash bucket. A lookup hashes the
//! ASCII-folded name, jumps to the first entry of its bucket and walks the
//! chain until the bucket changes. Names spread over several runs are
//! compared piecewise without joining them.

use once_cell::sync::Lazy;

use crate::store::{Fragment, Run, RunStore};

mod tables;

pub use tables::{AttrId, ContentModel, TagId};

const BUCKETS: usize = 512;
const NO_ENTRY: u16 = u16::MAX;
const HASH_SEED: u32 = 5381;

pub(crate) trait NameId: Copy + Send + Sync + 'static {
    const UNKNOWN: Self;

    fn known() -> &'static [(Self, &'static str)];
}

struct Entry<Id> {
    bucket: u16,
    name: &'static str,
    id: Id,
}

struct NameTable<Id> {
    entries: Vec<Entry<Id>>,
    first: Vec<u16>,
    longest: usize,
}

static TAGS: Lazy<NameTable<TagId>> = Lazy::new(NameTable::build);
static ATTRS: Lazy<NameTable<AttrId>> = Lazy::new(NameTable::build);

impl<Id: NameId> NameTable<Id> {
    fn build() -> Self {
        let mut entries: Vec<Entry<Id>> = Id::known()
            .iter()
            .map(|&(id, name)| Entry {
                bucket: bucket_of(hash_bytes(HASH_SEED, name.as_bytes())),
                name,
                id,
            })
            .collect();
        entries.sort_by_key(|entry| entry.bucket);

        let mut first = vec![NO_ENTRY; BUCKETS];
        for (index, entry) in entries.iter().enumerate().rev() {
            first[entry.bucket as usize] = index as u16;
        }
        let longest = entries.iter().map(|entry| entry.name.len()).max().unwrap_or(0);
        Self {
            entries,
            first,
            longest,
        }
    }

    fn lookup<'a, I>(&self, pieces: I) -> Id
    where
        I: Iterator<Item = &'a str> + Clone,
    {
        let mut len = 0usize;
        let mut hash = HASH_SEED;
        for piece in pieces.clone() {
            len += piece.len();
            if len > self.longest {
                return Id::UNKNOWN;
            }
            hash = hash_bytes(hash, piece.as_bytes());
        }
        if len == 0 {
            return Id::UNKNOWN;
        }

        let bucket = bucket_of(hash);
        let mut index = self.first[bucket as usize] as usize;
        while let Some(entry) = self.entries.get(index)
            && entry.bucket == bucket
        {
            if entry.name.len() == len && eq_folded(pieces.clone(), entry.name) {
                return entry.id;
            }
            index += 1;
        }
        Id::UNKNOWN
    }
}

fn hash_bytes(mut hash: u32, bytes: &[u8]) -> u32 {
    for &b in bytes {
        hash = hash.wrapping_mul(33) ^ u32::from(b.to_ascii_lowercase());
    }
    hash
}

fn bucket_of(hash: u32) -> u16 {
    ((hash ^ (hash >> 15)) as usize & (BUCKETS - 1)) as u16
}

fn eq_folded<'a>(pieces: impl Iterator<Item = &'a str>, name: &str) -> bool {
    let mut expected = name.bytes();
    pieces
        .flat_map(str::bytes)
        .all(|b| expected.next() == Some(b.to_ascii_lowercase()))
}

pub fn lookup_tag(name: &str) -> TagId {
    TAGS.lookup(std::iter::once(name))
}

pub fn lookup_attribute(name: &str) -> AttrId {
    ATTRS.lookup(std::iter::once(name))
}

pub(crate) fn resolve_tag(fragment: &Fragment, runs: &RunStore, text: &str) -> TagId {
    TAGS.lookup(name_pieces(fragment, runs, text))
}

pub(crate) fn resolve_attribute(fragment: &Fragment, runs: &RunStore, text: &str) -> AttrId {
    ATTRS.lookup(name_pieces(fragment, runs, text))
}

fn name_pieces<'r, 't>(
    fragment: &Fragment,
    runs: &'r RunStore,
    text: &'t str,
) -> impl Iterator<Item = &'t str> + Clone + use<'r, 't> {
    fragment
        .runs(runs)
        .iter()
        .filter(|run| run.is_text_bearing())
        .map(move |run: &Run| run.source(text))
}
