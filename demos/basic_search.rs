/// Basic lucidx walkthrough
///
/// Indexes three small documents into ./data, commits them, then runs
/// term and boolean queries and prints the hits with their stored fields.

use lucidx::{
    new_index_searcher, new_index_writer, open_directory_reader, BooleanQuery, Directory,
    Document, Field, FsDirectory, IndexWriterConfig, OpenMode, Query, Term, TermQuery,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Step 1: Opening index in ./data");
    let dir: Arc<dyn Directory> = Arc::new(FsDirectory::open("data")?);
    let config = IndexWriterConfig::default().with_open_mode(OpenMode::Create);
    let writer = new_index_writer(dir.clone(), config)?;

    println!("Step 2: Adding documents");
    let rows = [("74", "86", "1237"), ("74", "123", "789"), ("741", "861", "12137")];
    for (a, b, c) in rows {
        let doc = Document::new()
            .with(Field::text("a", a, true))
            .with(Field::text("b", b, true))
            .with(Field::text("c", c, true));
        let doc_id = writer.add_document(&doc)?;
        println!("  add new document: {}", doc_id);
    }
    writer.commit()?;
    writer.close()?;
    println!();

    println!("Step 3: Searching");
    let reader = open_directory_reader(dir)?;
    let searcher = new_index_searcher(&reader);

    let queries: Vec<Query> = vec![
        TermQuery::new(Term::text("a", "74")).into(),
        TermQuery::new(Term::text("a", "741")).into(),
        BooleanQuery::builder()
            .should(TermQuery::new(Term::text("b", "86")))
            .should(TermQuery::new(Term::text("c", "789")))
            .build()?
            .into(),
    ];

    for query in &queries {
        let top = searcher.search_top_n(query, 1000)?;
        println!("  {} -> {} hits", query, top.total_hits);
        for hit in &top.score_docs {
            let doc = reader.document(hit.doc)?;
            let fields: Vec<String> = doc.fields.iter()
                .filter_map(|f| f.value.as_text().map(|v| format!("{}={}", f.name, v)))
                .collect();
            println!("    doc {} score {:.4} [{}]", hit.doc, hit.score, fields.join(", "));
        }
    }
    println!();

    println!("Step 4: Explaining the best hit for a:74");
    let top = searcher.search_top_n(&queries[0], 1)?;
    if let Some(best) = top.score_docs.first() {
        print!("{}", searcher.explain(&queries[0], best.doc)?);
    }

    reader.close()?;
    Ok(())
}
