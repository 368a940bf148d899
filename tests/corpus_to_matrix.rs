// End-to-end: scraped table directories → aggregated header CSV → loader →
// similarity matrix, using the offline hashing provider.

use std::path::Path;

use colsim::corpus::aggregate::{collect_headers, write_header_corpus};
use colsim::corpus::loader::load_header_corpus;
use colsim::embedding::hashing::HashingEmbedder;
use colsim::pipeline::{run_provider, ReportOptions};

fn table(root: &Path, lang: &str, file: &str, contents: &str) {
    let dir = root.join(lang);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), contents).unwrap();
}

#[test]
fn scraped_tables_flow_through_to_reports() {
    let corpus_dir = tempfile::tempdir().unwrap();
    let root = corpus_dir.path();
    table(
        root,
        "en",
        "eight_thousanders.csv",
        "Name,Height (m),Range\nEverest,8849,Himalaya\n",
    );
    table(
        root,
        "de",
        "achttausender.csv",
        "Name,Höhe (m),Gebirge\nMount Everest,8849,Himalaya\n",
    );
    table(root, "nl", "achtduizenders.csv", "Naam,Hoogte (m),Gebergte\n");
    // A language directory whose only table has a blank header row
    table(root, "zh", "table_0.csv", ",,\n1,2,3\n");

    let collected = collect_headers(root, true).unwrap();
    assert_eq!(collected.len(), 4);
    assert!(collected.get("zh").unwrap().is_empty());

    let aggregated = corpus_dir.path().join("aggregated_columns_by_language.csv");
    write_header_corpus(&collected, &aggregated).unwrap();

    let loaded = load_header_corpus(&aggregated).unwrap();
    assert_eq!(loaded, collected);

    let out_dir = tempfile::tempdir().unwrap();
    let mut options = ReportOptions::new(out_dir.path());
    options.compare_pairs = vec![("en".to_string(), "nl".to_string())];
    let report = run_provider(&HashingEmbedder::default(), &loaded, &options).unwrap();

    // zh has no headers and must not appear
    assert_eq!(report.matrix.languages(), ["de", "en", "nl"]);
    assert_eq!(report.embeddings.excluded, vec!["zh"]);

    // Shared spelling ("Name", "(m)") gives en and de a positive similarity
    let en_de = report.matrix.get("en", "de").unwrap();
    assert!(en_de > 0.0, "got {en_de}");

    let cmp = std::fs::read_to_string(out_dir.path().join("hashing").join("en_vs_nl_columns.csv"))
        .unwrap();
    assert!(cmp.starts_with("en_columns,nl_columns\nName,Naam\n"));
}

#[test]
fn malformed_input_is_rejected_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.csv");
    std::fs::write(&input, "Language,c1\nen,Name\n").unwrap();

    let err = load_header_corpus(&input).unwrap_err();
    assert!(format!("{err:#}").contains("Directory"));
}
