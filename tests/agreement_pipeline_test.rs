//! End-to-end tests: index -> validate -> build studies -> calculate

use iaa_calc::agreement::{BlockOutcome, BuiltinBackend};
use iaa_calc::models::{
    parse_metric_arg, DatasetLayout, IaaConfig, IaaError, MultiTagPolicy, UNMARKED,
};
use iaa_calc::services::{AnnotationSetIndexer, IaaSession, ParseCache};
use iaa_calc::study::{CategorySource, CodingStudyBuilder, StudyContext, UnitizingStudyBuilder};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const TEXTS: [(&str, &str); 4] = [
    ("doc1", "The cat sat on the mat."),
    ("doc2", "Dogs bark loudly."),
    ("doc3", "Birds fly south in winter."),
    ("doc4", "Fish swim."),
];

const ANNOTATORS: [&str; 5] = ["A", "B", "C", "D", "E"];

fn annotation(text: &str, tags: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<NounVerbTask>\n<TEXT><![CDATA[{}]]></TEXT>\n<TAGS>\n{}\n</TAGS>\n</NounVerbTask>\n",
        text, tags
    )
}

/// Tags every annotator agrees on, per document
fn shared_tags(document: &str) -> &'static str {
    match document {
        "doc1" => r#"<NOUN id="N0" spans="4~7" text="cat" number="sg"/><VERB id="V0" spans="8~11" text="sat"/>"#,
        "doc2" => r#"<NOUN id="N0" spans="0~4" text="Dogs" number="pl"/><VERB id="V0" spans="5~9" text="bark"/>"#,
        "doc3" => r#"<NOUN id="N0" spans="0~5" text="Birds" number="pl"/>"#,
        _ => r#"<NOUN id="N0" spans="0~4" text="Fish"/>"#,
    }
}

/// Five annotators, four documents; E has no file for doc3
fn create_dataset(root: &Path) {
    for (document, text) in TEXTS {
        for annotator in ANNOTATORS {
            if document == "doc3" && annotator == "E" {
                continue;
            }
            fs::write(
                root.join(format!("{}_{}.xml", document, annotator)),
                annotation(text, shared_tags(document)),
            )
            .unwrap();
        }
    }
}

fn total_text_length() -> usize {
    TEXTS.iter().map(|(_, text)| text.chars().count()).sum()
}

#[test]
fn test_index_matrix_shape() {
    let temp_dir = TempDir::new().unwrap();
    create_dataset(temp_dir.path());

    let index = AnnotationSetIndexer::new(temp_dir.path()).index().unwrap();
    assert_eq!(index.layout, DatasetLayout::Flat);
    assert_eq!(index.annotators(), &ANNOTATORS.map(String::from));
    assert_eq!(index.documents().len(), 4);

    for document in index.documents() {
        assert_eq!(document.files.len(), 5);
        let expected_missing = if document.id == "doc3" { 1 } else { 0 };
        assert_eq!(document.missing_count(), expected_missing, "{}", document.id);
    }
    assert!(index.documents()[2].file(4).is_none());
}

#[test]
fn test_indexing_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    create_dataset(temp_dir.path());

    let first = AnnotationSetIndexer::new(temp_dir.path()).index().unwrap();
    let second = AnnotationSetIndexer::new(temp_dir.path()).index().unwrap();
    assert_eq!(first.annotators(), second.annotators());
    assert_eq!(first.documents(), second.documents());
}

#[test]
fn test_directory_layout_matches_flat_layout() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for annotator in ["A", "B"] {
        let dir = root.join(annotator);
        fs::create_dir(&dir).unwrap();
        for (document, text) in &TEXTS[..2] {
            fs::write(
                dir.join(format!("{}_{}.xml", document, annotator)),
                annotation(text, shared_tags(document)),
            )
            .unwrap();
        }
    }

    let mut session = IaaSession::open(root, IaaConfig::default()).unwrap();
    assert_eq!(session.index().layout, DatasetLayout::Directory);
    assert_eq!(session.index().annotators(), &["A".to_string(), "B".to_string()]);

    let (metric, targets) = parse_metric_arg("global_multi_pi=NOUN,VERB").unwrap();
    let report = session
        .calculate(&BTreeMap::from([(metric, targets)]), &BuiltinBackend)
        .unwrap();
    let score = report.score("global_multi_pi", "cross-tag_multi_pi").unwrap();
    assert!((score - 1.0).abs() < 1e-9);
}

#[test]
fn test_unitizing_line_covers_all_documents() {
    let temp_dir = TempDir::new().unwrap();
    create_dataset(temp_dir.path());

    let mut session = IaaSession::open(temp_dir.path(), IaaConfig::default()).unwrap();
    let lengths = session.validate().unwrap().document_lengths.clone();
    assert_eq!(lengths.iter().sum::<usize>(), total_text_length());

    let approved = session.approved_slots();
    let context = StudyContext::new(session.cache(), &approved, &lengths);
    let study = UnitizingStudyBuilder::new(context)
        .build(
            &["NOUN".to_string(), "VERB".to_string()],
            &CategorySource::TagType,
        )
        .unwrap();

    assert_eq!(study.continuum_length(), total_text_length());

    // Every unit lies inside the range owned by its source document
    let mut ranges = Vec::new();
    let mut start = 0;
    for length in &lengths {
        ranges.push(start..start + length);
        start += length;
    }
    for unit in study.units() {
        assert!(
            ranges
                .iter()
                .any(|r| r.contains(&unit.offset) && unit.end() <= r.end),
            "unit {:?} crosses a document boundary",
            unit
        );
    }

    // Two tags from five annotators in doc1 and doc2, one NOUN from four in doc3, one from five in doc4
    assert_eq!(study.units().len(), 5 * 2 + 5 * 2 + 4 + 5);
}

#[test]
fn test_coding_row_with_different_types_on_one_span() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let text = "run fast";
    fs::write(root.join("d1_A.xml"), annotation(text, r#"<NOUN id="N0" spans="0~3"/>"#)).unwrap();
    fs::write(root.join("d1_B.xml"), annotation(text, r#"<VERB id="V0" spans="0~3"/>"#)).unwrap();
    fs::write(root.join("d1_C.xml"), annotation(text, "")).unwrap();

    let index = AnnotationSetIndexer::new(root).index().unwrap();
    let cache = ParseCache::new(Arc::new(index));
    let lengths = vec![text.len()];
    let approved = vec![0, 1, 2];
    let study = CodingStudyBuilder::new(
        StudyContext::new(&cache, &approved, &lengths),
        "global_multi_kappa",
        MultiTagPolicy::Reject,
    )
    .build(
        &["NOUN".to_string(), "VERB".to_string()],
        &CategorySource::TagType,
    )
    .unwrap();

    assert_eq!(study.item_count(), 1);
    assert_eq!(study.rows()[0], vec!["NOUN", "VERB", UNMARKED]);
}

#[test]
fn test_duplicate_tagging_fails_only_that_metric() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let text = "run fast";
    fs::write(
        root.join("d1_A.xml"),
        annotation(text, r#"<NOUN id="N0" spans="0~3"/><VERB id="V0" spans="0~3"/>"#),
    )
    .unwrap();
    fs::write(root.join("d1_B.xml"), annotation(text, r#"<VERB id="V0" spans="0~3"/>"#)).unwrap();

    let mut session = IaaSession::open(root, IaaConfig::default()).unwrap();
    let mut requests = BTreeMap::new();
    for arg in ["global_multi_kappa=NOUN,VERB", "local_multi_pi=VERB", "local_krippendorff=VERB"] {
        let (metric, targets) = parse_metric_arg(arg).unwrap();
        requests.insert(metric, targets);
    }

    let report = session.calculate(&requests, &BuiltinBackend).unwrap();
    assert_eq!(report.blocks.len(), 3);
    match &report.blocks[0].outcome {
        BlockOutcome::Failed { error } => {
            assert!(error.contains("global_multi_kappa"));
            assert!(error.contains("0~3"));
        }
        other => panic!("expected a failed block, got {:?}", other),
    }
    assert_eq!(report.blocks[1].outcome, BlockOutcome::Undefined);
    assert!(report.score("local_multi_pi", "VERB").is_some());

    let text = report.render_text(4);
    assert!(text.contains("metric not defined\tlocal_krippendorff"));
    assert!(text.contains("\tlocal_multi_pi\tVERB"));
}

#[test]
fn test_multi_tag_policy_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let text = "run fast";
    fs::write(
        root.join("d1_A.xml"),
        annotation(text, r#"<VERB id="V0" spans="0~3"/><NOUN id="N0" spans="0~3"/>"#),
    )
    .unwrap();
    fs::write(root.join("d1_B.xml"), annotation(text, r#"<NOUN id="N0" spans="0~3"/>"#)).unwrap();
    fs::write(
        root.join("iaa.toml"),
        "multi_tag = \"first-by-type-name\"\n\n[metrics.global_multi_pi]\nNOUN = []\nVERB = []\n",
    )
    .unwrap();

    let config = IaaConfig::load(&IaaConfig::default_path(root)).unwrap();
    let mut session = IaaSession::open(root, config).unwrap();
    let report = session.calculate_configured(&BuiltinBackend).unwrap();

    let score = report.score("global_multi_pi", "cross-tag_multi_pi").unwrap();
    assert!((score - 1.0).abs() < 1e-9);
}

#[test]
fn test_text_mismatch_aborts_calculation() {
    let temp_dir = TempDir::new().unwrap();
    create_dataset(temp_dir.path());
    fs::write(
        temp_dir.path().join("doc2_C.xml"),
        annotation("Dogs bark quietly.", ""),
    )
    .unwrap();

    let mut session = IaaSession::open(temp_dir.path(), IaaConfig::default()).unwrap();
    let (metric, targets) = parse_metric_arg("local_alpha_u=NOUN").unwrap();
    let err = session
        .calculate(&BTreeMap::from([(metric, targets)]), &BuiltinBackend)
        .unwrap_err();

    match err {
        IaaError::TextMismatch { document, file } => {
            assert_eq!(document, "doc2");
            assert_eq!(file, temp_dir.path().join("doc2_C.xml"));
        }
        other => panic!("expected text mismatch, got {:?}", other),
    }
}

#[test]
fn test_disagreeing_annotator_lowers_scores() {
    let temp_dir = TempDir::new().unwrap();
    create_dataset(temp_dir.path());
    // D tags "the mat" instead of "cat" and calls "sat" a NOUN
    fs::write(
        temp_dir.path().join("doc1_D.xml"),
        annotation(
            TEXTS[0].1,
            r#"<NOUN id="N0" spans="15~22" number="sg"/><NOUN id="N1" spans="8~11"/>"#,
        ),
    )
    .unwrap();

    // E lacks doc3, which would keep every score below 1
    let config = IaaConfig {
        ignored_annotators: vec!["E".to_string()],
        ..IaaConfig::default()
    };
    let mut session = IaaSession::open(temp_dir.path(), config).unwrap();
    let mut requests = BTreeMap::new();
    for arg in ["local_alpha_u=NOUN:number", "local_multi_pi=NOUN:number,VERB"] {
        let (metric, targets) = parse_metric_arg(arg).unwrap();
        requests.insert(metric, targets);
    }

    let with_d = session.calculate(&requests, &BuiltinBackend).unwrap();
    session.ignore_annotator("D").unwrap();
    let without_d = session.calculate(&requests, &BuiltinBackend).unwrap();

    for (metric, key) in [
        ("local_alpha_u", "NOUN::(spans)"),
        ("local_alpha_u", "NOUN::number"),
        ("local_multi_pi", "NOUN"),
        ("local_multi_pi", "VERB"),
    ] {
        let lower = with_d.score(metric, key).unwrap();
        let full = without_d.score(metric, key).unwrap();
        assert!((full - 1.0).abs() < 1e-9, "{} {} = {}", metric, key, full);
        assert!(lower < full, "{} {}: {} !< {}", metric, key, lower, full);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_prefetch_then_calculate_parses_each_file_once() {
    let temp_dir = TempDir::new().unwrap();
    create_dataset(temp_dir.path());

    let config = IaaConfig {
        parse_workers: 3,
        ..IaaConfig::default()
    };
    let mut session = IaaSession::open(temp_dir.path(), config).unwrap();
    session.prefetch(None).await.unwrap();
    assert_eq!(session.cache().parsed_file_count(), 19);

    let (metric, targets) = parse_metric_arg("global_alpha_u=NOUN,VERB").unwrap();
    session
        .calculate(&BTreeMap::from([(metric, targets)]), &BuiltinBackend)
        .unwrap();
    assert_eq!(session.cache().parsed_file_count(), 19);
    assert!(session.warnings().is_empty());
}
