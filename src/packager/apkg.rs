//! Anki package (.apkg) writer.
//!
//! A package is a zip holding `collection.anki2`, a schema 11 SQLite
//! collection, and a `media` map. Generated decks carry no media, so the
//! map is always empty.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use rusqlite::{params, Connection};
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::render::{NoteModel, CARD_TEMPLATE_NAME};
use super::Result;

/// Name of the collection database inside the package
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Name of the media map inside the package
pub const MEDIA_ENTRY: &str = "media";

const SCHEMA: &str = r#"
CREATE TABLE col (
    id integer primary key,
    crt integer not null,
    mod integer not null,
    scm integer not null,
    ver integer not null,
    dty integer not null,
    usn integer not null,
    ls integer not null,
    conf text not null,
    models text not null,
    decks text not null,
    dconf text not null,
    tags text not null
);
CREATE TABLE notes (
    id integer primary key,
    guid text not null,
    mid integer not null,
    mod integer not null,
    usn integer not null,
    tags text not null,
    flds text not null,
    sfld integer not null,
    csum integer not null,
    flags integer not null,
    data text not null
);
CREATE TABLE cards (
    id integer primary key,
    nid integer not null,
    did integer not null,
    ord integer not null,
    mod integer not null,
    usn integer not null,
    type integer not null,
    queue integer not null,
    due integer not null,
    ivl integer not null,
    factor integer not null,
    reps integer not null,
    lapses integer not null,
    left integer not null,
    odue integer not null,
    odid integer not null,
    flags integer not null,
    data text not null
);
CREATE TABLE revlog (
    id integer primary key,
    cid integer not null,
    usn integer not null,
    ease integer not null,
    ivl integer not null,
    lastIvl integer not null,
    factor integer not null,
    time integer not null,
    type integer not null
);
CREATE TABLE graves (
    usn integer not null,
    oid integer not null,
    type integer not null
);
CREATE INDEX ix_notes_usn ON notes (usn);
CREATE INDEX ix_cards_usn ON cards (usn);
CREATE INDEX ix_revlog_usn ON revlog (usn);
CREATE INDEX ix_cards_nid ON cards (nid);
CREATE INDEX ix_cards_sched ON cards (did, queue, due);
CREATE INDEX ix_revlog_cid ON revlog (cid);
CREATE INDEX ix_notes_csum ON notes (csum);
"#;

/// Anki separates note field values with the unit separator
const FIELD_SEPARATOR: &str = "\x1f";

/// Deck every collection must contain
const DEFAULT_DECK_ID: i64 = 1;

/// A deck ready to be written out
#[derive(Debug, Clone)]
pub struct DeckContents {
    pub deck_id: i64,
    pub deck_name: String,
    pub model: NoteModel,
    /// One value list per note, in model field order
    pub notes: Vec<Vec<String>>,
}

fn html_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("HTML tag pattern is valid"))
}

/// Sort field text: the first field with markup removed
fn sort_field(value: &str) -> String {
    html_tag_regex().replace_all(value, "").trim().to_string()
}

/// Duplicate-detection checksum: first 8 hex digits of the SHA-1 of the sort field
pub fn field_checksum(value: &str) -> i64 {
    let digest = Sha1::digest(sort_field(value).as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

fn model_json(model: &NoteModel, deck_id: i64, now: i64) -> Value {
    let fields: Vec<Value> = model
        .fields
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "name": name,
                "ord": ord,
                "font": "Arial",
                "size": 20,
                "media": [],
                "rtl": false,
                "sticky": false
            })
        })
        .collect();
    let front_ords: Vec<usize> = (0..model.front_count).collect();

    json!({
        "id": model.id,
        "name": model.name,
        "type": 0,
        "mod": now,
        "usn": -1,
        "sortf": 0,
        "did": deck_id,
        "tmpls": [{
            "name": CARD_TEMPLATE_NAME,
            "ord": 0,
            "qfmt": model.qfmt,
            "afmt": model.afmt,
            "bqfmt": "",
            "bafmt": "",
            "did": null
        }],
        "flds": fields,
        "css": model.css,
        "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
        "latexPost": "\\end{document}",
        "tags": [],
        "vers": [],
        "req": [[0, "any", front_ords]]
    })
}

fn deck_json(id: i64, name: &str, now: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": "",
        "mod": now,
        "usn": -1,
        "collapsed": false,
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0]
    })
}

fn collection_conf(model_id: i64, deck_id: i64) -> Value {
    json!({
        "activeDecks": [deck_id],
        "curDeck": deck_id,
        "curModel": model_id.to_string(),
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true
    })
}

fn deck_options() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "maxTaken": 60,
            "timer": 0,
            "autoplay": true,
            "replayq": true,
            "dyn": false,
            "new": {
                "delays": [1, 10],
                "ints": [1, 4, 7],
                "initialFactor": 2500,
                "order": 1,
                "perDay": 20,
                "bury": true,
                "separate": true
            },
            "lapse": {
                "delays": [10],
                "mult": 0,
                "minInt": 1,
                "leechAction": 0,
                "leechFails": 8
            },
            "rev": {
                "perDay": 100,
                "ease4": 1.3,
                "fuzz": 0.05,
                "maxIvl": 36500,
                "ivlFct": 1,
                "minSpace": 1,
                "bury": true
            }
        }
    })
}

/// Write the collection database for `deck` into `db_path`.
fn write_collection(db_path: &Path, deck: &DeckContents) -> Result<()> {
    let now = Utc::now();
    let now_secs = now.timestamp();
    let now_millis = now.timestamp_millis();

    let conn = Connection::open(db_path)?;
    conn.execute_batch(SCHEMA)?;

    let mut models = Map::new();
    models.insert(
        deck.model.id.to_string(),
        model_json(&deck.model, deck.deck_id, now_secs),
    );

    let mut decks = Map::new();
    decks.insert(DEFAULT_DECK_ID.to_string(), deck_json(DEFAULT_DECK_ID, "Default", 0));
    decks.insert(deck.deck_id.to_string(), deck_json(deck.deck_id, &deck.deck_name, now_secs));

    conn.execute(
        "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
         VALUES (1, ?1, ?2, ?2, 11, 0, 0, 0, ?3, ?4, ?5, ?6, '{}')",
        params![
            now_secs,
            now_millis,
            serde_json::to_string(&collection_conf(deck.model.id, deck.deck_id))?,
            serde_json::to_string(&models)?,
            serde_json::to_string(&decks)?,
            serde_json::to_string(&deck_options())?,
        ],
    )?;

    let mut card_count = 0;
    for (position, values) in deck.notes.iter().enumerate() {
        // Millisecond timestamps, offset per note to stay unique
        let note_id = now_millis + position as i64;
        let first = values.first().map(String::as_str).unwrap_or_default();

        conn.execute(
            "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
             VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
            params![
                note_id,
                uuid::Uuid::new_v4().simple().to_string(),
                deck.model.id,
                now_secs,
                values.join(FIELD_SEPARATOR),
                sort_field(first),
                field_checksum(first),
            ],
        )?;

        // The template renders only when some front field has content
        let has_front = values
            .iter()
            .take(deck.model.front_count)
            .any(|v| !v.trim().is_empty());
        if !has_front {
            log::warn!("Note {} has an empty front, no card generated", position + 1);
            continue;
        }

        conn.execute(
            "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data)
             VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            params![note_id, note_id, deck.deck_id, now_secs, position as i64 + 1],
        )?;
        card_count += 1;
    }

    conn.close().map_err(|(_, e)| e)?;

    log::debug!("Wrote {} notes and {} cards to collection", deck.notes.len(), card_count);
    Ok(())
}

/// Write `deck` as an .apkg file at `output_path`.
pub fn write_package(deck: &DeckContents, output_path: &Path) -> Result<()> {
    let scratch = tempfile::tempdir()?;
    let db_path = scratch.path().join(COLLECTION_ENTRY);
    write_collection(&db_path, deck)?;
    let collection = fs::read(&db_path)?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_ENTRY, options)?;
    zip.write_all(&collection)?;

    zip.start_file(MEDIA_ENTRY, options)?;
    zip.write_all(b"{}")?;

    zip.finish()?;
    Ok(())
}
