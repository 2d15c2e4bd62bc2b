use std::sync::Arc;
use std::thread;
use lucidx::codec::{BinaryCodec, Codec, SimpleTextCodec};
use lucidx::query::BooleanQueryBuilder;
use lucidx::{
    new_index_searcher, new_index_writer, open_directory_reader, BooleanQuery, DocId, Document,
    ErrorKind, Field, FieldValue, FsDirectory, IndexWriterConfig, Query, SearchConfig, Term,
    TermQuery,
};
use tempfile::TempDir;

fn fs_directory(tmp: &TempDir) -> Arc<FsDirectory> {
    Arc::new(FsDirectory::open(tmp.path().join("index")).unwrap())
}

fn text_doc(field: &str, text: &str) -> Document {
    Document::new().with(Field::text(field, text, true))
}

fn term(field: &str, text: &str) -> Query {
    TermQuery::new(Term::text(field, text)).into()
}

#[test]
fn test_exact_term_matching() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);

    let writer = new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap();
    for value in ["74", "74", "741"] {
        writer.add_document(&text_doc("a", value)).unwrap();
    }
    writer.commit().unwrap();
    writer.close().unwrap();

    let reader = open_directory_reader(dir).unwrap();
    let searcher = new_index_searcher(&reader);

    let top = searcher.search_top_n(&term("a", "74"), 1000).unwrap();
    assert_eq!(top.total_hits, 2);
    let mut docs = top.docs();
    docs.sort();
    assert_eq!(docs, vec![DocId(0), DocId(1)]);

    let top = searcher.search_top_n(&term("a", "741"), 1000).unwrap();
    assert_eq!(top.total_hits, 1);
    assert_eq!(top.docs(), vec![DocId(2)]);
    assert_eq!(reader.document(DocId(2)).unwrap().get_text("a"), Some("741"));

    reader.close().unwrap();
}

#[test]
fn test_stored_fields_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);
    let blob = vec![0u8, 1, 2, 254, 255, b'\n'];

    let writer = new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap();
    writer.add_document(&Document::new()
        .with(Field::text("title", "Crème brûlée, 100% good", true))
        .with(Field::text("body", "indexed but not stored", false))
        .with(Field::string("tag", "dessert", true))
        .with(Field::bytes("raw", blob.clone(), false, true))
        .with(Field::text("title", "second title", true)))
        .unwrap();
    writer.commit().unwrap();
    writer.close().unwrap();

    let reader = open_directory_reader(dir.clone()).unwrap();
    let doc = reader.document(DocId(0)).unwrap();
    let stored: Vec<(&str, &FieldValue)> = doc.fields.iter().map(|f| (f.name.as_str(), &f.value)).collect();
    assert_eq!(stored, vec![
        ("title", &FieldValue::Text("Crème brûlée, 100% good".to_string())),
        ("tag", &FieldValue::Text("dessert".to_string())),
        ("raw", &FieldValue::Bytes(blob)),
        ("title", &FieldValue::Text("second title".to_string())),
    ]);
    assert!(reader.document(DocId(1)).unwrap_err().is(ErrorKind::NotFound));

    // The unstored body is still searchable
    let searcher = new_index_searcher(&reader);
    assert_eq!(searcher.count(&term("body", "stored")).unwrap(), 1);
    assert_eq!(searcher.count(&term("tag", "dessert")).unwrap(), 1);
}

#[test]
fn test_single_must_equals_term_query() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);
    let writer = new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap();
    let texts = [
        "the quick brown fox",
        "quick quick quick",
        "lazy dog",
        "a quick dog jumps over the quick fox again",
    ];
    for text in texts {
        writer.add_document(&text_doc("body", text)).unwrap();
    }
    writer.commit().unwrap();

    let reader = open_directory_reader(dir).unwrap();
    let searcher = new_index_searcher(&reader);
    let bare = searcher.search_top_n(&term("body", "quick"), 10).unwrap();
    let wrapped: Query = BooleanQuery::builder().must(term("body", "quick")).build().unwrap().into();
    let wrapped = searcher.search_top_n(&wrapped, 10).unwrap();

    assert_eq!(bare.total_hits, 3);
    assert_eq!(bare, wrapped);
}

#[test]
fn test_boolean_clauses() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);
    let writer = new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap();
    let texts = [
        "rust systems programming",     // 0
        "rust web programming",         // 1
        "python web scripting",         // 2
        "rust embedded systems",        // 3
        "go systems programming",       // 4
    ];
    for text in texts {
        writer.add_document(&text_doc("body", text)).unwrap();
    }
    writer.commit().unwrap();

    let reader = open_directory_reader(dir).unwrap();
    let searcher = new_index_searcher(&reader);
    let sorted_docs = |query: Query| {
        let mut docs = searcher.search_top_n(&query, 10).unwrap().docs();
        docs.sort();
        docs.into_iter().map(|d| d.0).collect::<Vec<_>>()
    };

    let and = BooleanQuery::builder().must(term("body", "rust")).must(term("body", "systems")).build().unwrap();
    assert_eq!(sorted_docs(and.into()), vec![0, 3]);

    let or = BooleanQuery::builder().should(term("body", "python")).should(term("body", "go")).build().unwrap();
    assert_eq!(sorted_docs(or.into()), vec![2, 4]);

    let not = BooleanQuery::builder()
        .must(term("body", "programming"))
        .must_not(term("body", "web"))
        .build()
        .unwrap();
    assert_eq!(sorted_docs(not.into()), vec![0, 4]);

    // Should clauses only add score once a Must clause exists
    let boosted = BooleanQuery::builder()
        .must(term("body", "programming"))
        .should(term("body", "go"))
        .build()
        .unwrap();
    let top = searcher.search_top_n(&boosted.into(), 10).unwrap();
    assert_eq!(top.total_hits, 3);
    assert_eq!(top.score_docs[0].doc, DocId(4));

    let nested = BooleanQuery::builder()
        .must(BooleanQuery::builder().should(term("body", "rust")).should(term("body", "go")).build().unwrap())
        .must_not(term("body", "embedded"))
        .build()
        .unwrap();
    assert_eq!(sorted_docs(nested.into()), vec![0, 1, 4]);

    let err = BooleanQuery::builder().must_not(term("body", "rust")).build().unwrap_err();
    assert!(err.is(ErrorKind::InvalidQuery));

    let config = SearchConfig { max_clause_count: 1 };
    let err = BooleanQueryBuilder::with_config(&config)
        .should(term("body", "rust"))
        .should(term("body", "go"))
        .build()
        .unwrap_err();
    assert!(err.is(ErrorKind::InvalidQuery));
}

#[test]
fn test_top_n_ordering() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);
    let writer = new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap();
    for i in 0..50u32 {
        let text = vec!["match"; (i % 7 + 1) as usize].join(" ") + " filler";
        writer.add_document(&text_doc("body", &text)).unwrap();
        if i % 20 == 19 {
            writer.commit().unwrap();
        }
    }
    writer.commit().unwrap();

    let reader = open_directory_reader(dir).unwrap();
    assert_eq!(reader.segments().len(), 3);
    let searcher = new_index_searcher(&reader);
    let top = searcher.search_top_n(&term("body", "match"), 10).unwrap();
    assert_eq!(top.total_hits, 50);
    assert_eq!(top.score_docs.len(), 10);
    for pair in top.score_docs.windows(2) {
        assert!(
            pair[0].score > pair[1].score || (pair[0].score == pair[1].score && pair[0].doc < pair[1].doc),
            "{:?} before {:?}", pair[0], pair[1]
        );
    }
    assert_eq!(top.max_score, Some(top.score_docs[0].score));
}

#[test]
fn test_snapshot_isolation() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);
    let writer = new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap();
    writer.add_document(&text_doc("body", "first")).unwrap();
    writer.commit().unwrap();

    let before = open_directory_reader(dir.clone()).unwrap();
    writer.add_document(&text_doc("body", "first second")).unwrap();
    writer.commit().unwrap();
    writer.add_document(&text_doc("body", "uncommitted first")).unwrap();

    let after = open_directory_reader(dir.clone()).unwrap();
    assert_eq!(before.max_doc(), 1);
    assert_eq!(after.max_doc(), 2);
    assert!(after.generation() > before.generation());

    let old_hits = new_index_searcher(&before).search_top_n(&term("body", "first"), 10).unwrap();
    assert_eq!(old_hits.total_hits, 1);
    let new_hits = new_index_searcher(&after).search_top_n(&term("body", "first"), 10).unwrap();
    assert_eq!(new_hits.total_hits, 2);
    assert_eq!(before.postings(&Term::text("body", "second")).count(), 0);
}

#[test]
fn test_terms_and_statistics() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);
    let writer = new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap();
    writer.add_document(&text_doc("body", "delta alpha")).unwrap();
    writer.commit().unwrap();
    writer.add_document(&text_doc("body", "charlie alpha alpha")).unwrap();
    writer.add_document(&text_doc("title", "bravo")).unwrap();
    writer.commit().unwrap();

    let reader = open_directory_reader(dir).unwrap();
    let terms = reader.terms("body");
    let collected: Vec<Vec<u8>> = terms.iter().collect();
    assert_eq!(collected, vec![b"alpha".to_vec(), b"charlie".to_vec(), b"delta".to_vec()]);
    assert_eq!(terms.iter().count(), 3, "terms can be iterated again");
    assert_eq!(reader.terms("missing").iter().count(), 0);

    let alpha = Term::text("body", "alpha");
    let postings: Vec<(DocId, u32)> = reader.postings(&alpha).collect();
    assert_eq!(postings, vec![(DocId(0), 1), (DocId(1), 2)]);
    assert_eq!(reader.doc_freq(&alpha), 2);
    assert_eq!(reader.total_term_freq(&alpha), 3);

    let stats = reader.field_stats("body").unwrap();
    assert_eq!(stats.doc_count, 2);
    assert_eq!(stats.sum_total_term_freq, 5);
    assert!(reader.field_stats("missing").is_none());
}

#[test]
fn test_both_codecs_round_trip_files() {
    let codecs: Vec<Arc<dyn Codec>> = vec![Arc::new(SimpleTextCodec), Arc::new(BinaryCodec::default())];
    for codec in codecs {
        let tmp = TempDir::new().unwrap();
        let dir = fs_directory(&tmp);
        let config = IndexWriterConfig::default().with_codec(codec.clone());
        let writer = new_index_writer(dir.clone(), config).unwrap();
        writer.add_document(&text_doc("body", "hello codec world")).unwrap();
        writer.add_document(&Document::new().with(Field::bytes("id", vec![0, 159, 146, 150], true, true))).unwrap();
        writer.commit().unwrap();
        writer.close().unwrap();

        let file = format!("_0.{}", codec.extension());
        let data = std::fs::read(tmp.path().join("index").join(&file)).unwrap();
        let segment = codec.decode(&data).unwrap();
        assert_eq!(codec.encode(&segment).unwrap(), data, "{} re-encodes identically", codec.name());

        let reader = open_directory_reader(dir).unwrap();
        let searcher = new_index_searcher(&reader);
        assert_eq!(searcher.count(&term("body", "codec")).unwrap(), 1);
        let id = Term::new("id", vec![0, 159, 146, 150]);
        assert_eq!(searcher.search_top_n(&id.into(), 1).unwrap().docs(), vec![DocId(1)]);
    }
}

#[test]
fn test_concurrent_adds_and_commits() {
    let tmp = TempDir::new().unwrap();
    let dir = fs_directory(&tmp);
    let writer = Arc::new(new_index_writer(dir.clone(), IndexWriterConfig::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                for i in 0..50 {
                    writer.add_document(&text_doc("body", &format!("thread{} shared item{}", t, i))).unwrap();
                    if i % 10 == 9 {
                        writer.commit().unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    writer.commit().unwrap();
    assert_eq!(writer.pending_docs(), 0);
    assert_eq!(writer.committed_docs(), 200);

    let reader = open_directory_reader(dir).unwrap();
    assert_eq!(reader.max_doc(), 200);
    let searcher = new_index_searcher(&reader);
    assert_eq!(searcher.count(&term("body", "shared")).unwrap(), 200);
    assert_eq!(searcher.count(&term("body", "thread2")).unwrap(), 50);
}
