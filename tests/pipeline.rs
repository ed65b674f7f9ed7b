// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline test: synthetic SQLite corpus in, ranked search
//! results out, with every header's declared counts checked against what
//! the bodies actually contain.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use jamharah::build::{
    run_build_from_sqlite, run_build_occurrences, run_build_postings, run_build_words_index,
    run_sort_occurrences, CatalogPaths,
};
use jamharah::format::catalog::{read_books_index, read_pages_index, TitleStore};
use jamharah::format::headers::{PostingsFileHeader, WordDictEntry, WordsIndexHeader};
use jamharah::format::textstore::TextStore;
use jamharah::occurrences::OccurrenceRecord;
use jamharah::postings::codec::PostingsList;
use jamharah::query::{print_hits, PostingsReader, SearchIndex, SearchOutcome, SnippetOptions};

fn make_book(dir: &Path, book_id: u32, pages: &[(u32, &str)], titles: &[(&str, u32)]) {
    let conn = rusqlite::Connection::open(dir.join(format!("{book_id:03}.sqlite"))).unwrap();
    conn.execute_batch(
        "CREATE TABLE title (tit TEXT, lvl INTEGER, sub INTEGER, id INTEGER);
         CREATE TABLE book (nass TEXT, id INTEGER, page INTEGER, part INTEGER);",
    )
    .unwrap();
    for (text, start) in titles {
        conn.execute(
            "INSERT INTO title VALUES (?1, 1, 0, ?2)",
            rusqlite::params![text, start],
        )
        .unwrap();
    }
    for (i, (page, text)) in pages.iter().enumerate() {
        conn.execute(
            "INSERT INTO book VALUES (?1, ?2, ?3, 1)",
            rusqlite::params![text, i as i64, page],
        )
        .unwrap();
    }
}

struct BuiltIndex {
    paths: CatalogPaths,
    occurrences_sorted: std::path::PathBuf,
    postings: std::path::PathBuf,
    words: std::path::PathBuf,
    emitted_occurrences: u64,
}

fn build_corpus(dir: &Path) -> BuiltIndex {
    make_book(
        dir,
        1,
        &[
            (1, "بسم الله الرحمن الرحيم"),
            (2, "الحمد لله رب العالمين"),
            (3, "الله نور السماوات"),
        ],
        &[("المقدمة", 1), ("الباب الاول", 3)],
    );
    make_book(
        dir,
        2,
        &[(1, "قال احمد بن حنبل"), (2, "روى البخاري عن احمد")],
        &[("مسند احمد", 1)],
    );

    let paths = CatalogPaths::in_dir(dir);
    run_build_from_sqlite(dir, &paths).unwrap();

    let occurrences = dir.join("occurrences.tmp");
    let occurrences_sorted = dir.join("occurrences.sorted.tmp");
    let postings = dir.join("postings.bin");
    let words = dir.join("words.idx");

    let emitted_occurrences =
        run_build_occurrences(&paths.books_bin, &paths.pages_idx, &occurrences).unwrap();
    run_sort_occurrences(&occurrences, &occurrences_sorted).unwrap();
    run_build_postings(&occurrences_sorted, &postings).unwrap();
    run_build_words_index(&occurrences_sorted, &postings, &words).unwrap();

    BuiltIndex {
        paths,
        occurrences_sorted,
        postings,
        words,
        emitted_occurrences,
    }
}

fn read_dictionary(path: &Path) -> Vec<WordDictEntry> {
    let mut file = File::open(path).unwrap();
    let header = WordsIndexHeader::read(&mut file).unwrap();
    let mut entries = Vec::with_capacity(header.entry_count as usize);
    for _ in 0..header.entry_count {
        entries.push(WordDictEntry::read_from(&mut file).unwrap());
    }
    entries
}

#[test]
fn headers_agree_with_bodies() {
    let dir = tempfile::tempdir().unwrap();
    let built = build_corpus(dir.path());

    // occurrence stream is sorted and complete
    assert!(jamharah::build::sort::verify_sorted(&built.occurrences_sorted).unwrap());
    let mut reader = BufReader::new(File::open(&built.occurrences_sorted).unwrap());
    let mut sorted_count = 0u64;
    let mut distinct_hashes = 0u64;
    let mut last_hash = None;
    while let Some(record) = OccurrenceRecord::read_from(&mut reader).unwrap() {
        sorted_count += 1;
        if last_hash != Some(record.word_hash) {
            distinct_hashes += 1;
            last_hash = Some(record.word_hash);
        }
    }
    assert_eq!(sorted_count, built.emitted_occurrences);

    // postings header totals match the stream
    let mut postings_file = File::open(&built.postings).unwrap();
    let postings_header = PostingsFileHeader::read(&mut postings_file).unwrap();
    assert_eq!(postings_header.total_postings, built.emitted_occurrences);

    // dictionary: one entry per distinct hash, strictly ascending, counts
    // summing to the postings total
    let entries = read_dictionary(&built.words);
    assert_eq!(entries.len() as u64, distinct_hashes);
    for pair in entries.windows(2) {
        assert!(pair[0].word_hash < pair[1].word_hash);
    }
    let count_sum: u64 = entries.iter().map(|e| e.postings_count).sum();
    assert_eq!(count_sum, postings_header.total_postings);

    // every block decodes with strictly increasing pages and positions
    let mut blocks = PostingsReader::open(&built.postings).unwrap();
    let mut decoded_postings = 0u64;
    for entry in &entries {
        let plain = blocks.read_block(entry).unwrap();
        let list = PostingsList::parse(&plain).unwrap();
        assert!(!list.is_empty());
        let mut last_page = None;
        for posting in list.iter() {
            if let Some(last) = last_page {
                assert!(posting.page_id > last);
            }
            last_page = Some(posting.page_id);
            for positions in posting.positions.windows(2) {
                assert!(positions[0] < positions[1]);
            }
            decoded_postings += u64::from(posting.term_freq);
        }
    }
    assert_eq!(decoded_postings, postings_header.total_postings);

    // page locators stay inside their blocks
    let store = TextStore::open(&built.paths.books_bin).unwrap();
    let pages = read_pages_index(&built.paths.pages_idx).unwrap();
    assert_eq!(pages.len(), 5);
    for page in &pages {
        let block = store.blocks()[page.block_id as usize];
        assert!(page.length > 0);
        assert!(page.offset_in_block + page.length <= block.uncompressed_size);
    }

    // books and titles line up
    let books = read_books_index(&built.paths.books_idx).unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].page_count, 3);
    assert_eq!(books[1].page_count, 2);
    let titles = TitleStore::open(&built.paths.titles_bin).unwrap();
    assert_eq!(titles.len(), 3);
    assert_eq!(titles.get(0).unwrap().text, "المقدمة");
}

#[test]
fn queries_rank_phrase_pages_first() {
    let dir = tempfile::tempdir().unwrap();
    let built = build_corpus(dir.path());

    let mut index = SearchIndex::open(&built.words, &built.postings).unwrap();

    // the exact phrase lives on page 0 only
    let SearchOutcome::Hits(hits) = index.search("بسم الله").unwrap() else {
        panic!("expected hits");
    };
    assert!(!hits.is_empty());
    assert_eq!(hits[0].page_id, 0);
    if hits.len() > 1 {
        assert!(hits[0].score > hits[1].score + 4.0);
    }

    // single term present on several pages
    let SearchOutcome::Hits(hits) = index.search("احمد").unwrap() else {
        panic!("expected hits");
    };
    let pages: Vec<u32> = hits.iter().map(|h| h.page_id).collect();
    assert_eq!(pages.len(), 2);
    assert!(pages.contains(&3) && pages.contains(&4));

    // normalization applies to queries: alef-with-madda matches bare alef
    let SearchOutcome::Hits(hits) = index.search("آحمد").unwrap() else {
        panic!("expected hits");
    };
    assert_eq!(hits.len(), 2);

    // AND of terms never co-occurring is empty; OR unions them
    let SearchOutcome::Hits(hits) = index.search("البخاري الرحيم").unwrap() else {
        panic!("expected hits");
    };
    assert!(hits.is_empty());
    let SearchOutcome::Hits(hits) = index.search("البخاري OR الرحيم").unwrap() else {
        panic!("expected hits");
    };
    assert_eq!(hits.len(), 2);

    // unknown word: no results, not an error
    let SearchOutcome::Hits(hits) = index.search("غيرموجود").unwrap() else {
        panic!("expected hits");
    };
    assert!(hits.is_empty());

    // delimiter-only query: no tokens
    assert!(matches!(
        index.search(" .,! ").unwrap(),
        SearchOutcome::NoTokens
    ));
}

#[test]
fn snippets_bracket_the_match() {
    let dir = tempfile::tempdir().unwrap();
    let built = build_corpus(dir.path());

    let mut index = SearchIndex::open(&built.words, &built.postings).unwrap();
    let SearchOutcome::Hits(hits) = index.search("احمد بن").unwrap() else {
        panic!("expected hits");
    };
    assert!(!hits.is_empty());

    let mut store = TextStore::open(&built.paths.books_bin).unwrap();
    let pages = read_pages_index(&built.paths.pages_idx).unwrap();
    let mut out = Vec::new();
    print_hits(
        &mut out,
        &mut store,
        &pages,
        &hits,
        "احمد بن",
        &SnippetOptions::default(),
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("«احمد بن»"), "got: {text}");
    assert!(text.contains("book 2"));
}

#[test]
fn multi_category_phrase_search() {
    let dir = tempfile::tempdir().unwrap();
    let built = build_corpus(dir.path());

    // same index twice: every phrase page shows up once per category
    let pairs = vec![
        (built.words.clone(), built.postings.clone()),
        (built.words.clone(), built.postings.clone()),
    ];
    let parsed = jamharah::query::parse_query("بسم الله").unwrap();
    let matches = jamharah::query::phrase_search_categories(&pairs, &parsed.hashes).unwrap();
    assert_eq!(matches, vec![(0, 0), (1, 0)]);
}
