use pretty_assertions::assert_eq;
use std::collections::HashSet;
use textbook_chunker::{
    resolve_leaves, word_count, ChunkRecord, ChunkingConfig, EntityCategory, LineKind, NodeId,
    Pipeline, PipelineConfig, PipelineOutput, RawText, WHOLE_DOCUMENT_TITLE,
};

const SAMPLE: &str = "Chapter 1\nIntroduction\n\nThis is a short paragraph about fever in infants.\n\nFEVER MANAGEMENT\n\nAcetaminophen 10-15 mg/kg every 4-6 hours is recommended.\n";

const VOCAB: &[&str] = &[
    "fever", "infant", "therapy", "the", "of", "pneumonia", "acetaminophen", "with", "growth",
    "and", "renal", "care", "newborn", "asthma", "is", "seen",
];

fn paragraph(seed: usize, words: usize) -> String {
    let body: Vec<&str> = (0..words)
        .map(|i| VOCAB[(seed * 7 + i * 3) % VOCAB.len()])
        .collect();
    format!("{}\n\n", body.join(" "))
}

fn repeated(word: &str, count: usize) -> String {
    format!("{}\n\n", vec![word; count].join(" "))
}

/// A small book with every heading level, bullets and a table
fn book() -> String {
    let mut text = String::from("Nelson Textbook of Pediatrics, 21st Edition\nCopyright ©2020\n\n");
    let mut seed = 0;
    let mut para = |words: usize| {
        seed += 1;
        paragraph(seed, words)
    };

    for part in ["I", "II"] {
        text.push_str(&format!("PART {part}\nFoundations Of Care\n\n"));
        for chapter in 1..=2 {
            text.push_str(&format!("Chapter {chapter}\nGrowth And Fever\n\n"));
            text.push_str(&para(30));
            text.push_str("Growth Charts\n\n");
            text.push_str(&para(20));
            text.push_str("CLINICAL MANIFESTATIONS\n\n");
            text.push_str(&para(90));
            text.push_str("Table 1 Doses\n| drug | dose | route |\n| ibuprofen | 10 mg/kg | oral |\n\n");
            text.push_str(&para(250));
            text.push_str(&format!("{chapter}.1 Normal Growth\n\n"));
            text.push_str(&para(60));
            text.push_str(&para(45));
            text.push_str(&format!("{chapter}.2 Short Stature\n\n"));
            text.push_str(&para(10));
            text.push_str(&format!("{chapter}.3 Failure To Thrive\n\n"));
            for _ in 0..6 {
                text.push_str(&para(35));
            }
            text.push_str("- first item of the list\n- second item of the list\n\n");
        }
    }
    text
}

fn compact_pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig {
        chunking: ChunkingConfig::compact(),
        ..Default::default()
    })
    .unwrap()
}

fn run_book() -> (RawText, PipelineOutput) {
    let raw = RawText::from_text(&book()).unwrap();
    let output = compact_pipeline().run(&raw);
    (raw, output)
}

/// Records split into runs belonging to one section group
fn section_runs(records: &[ChunkRecord]) -> Vec<&[ChunkRecord]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=records.len() {
        if i == records.len() || records[i].chunk_index_in_section == 0 {
            runs.push(&records[start..i]);
            start = i;
        }
    }
    runs
}

#[test]
fn sample_scenario() {
    let raw = RawText::from_text(SAMPLE).unwrap();
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&raw);

    let chapter = output
        .toc
        .nodes()
        .iter()
        .find(|node| node.level == 2)
        .unwrap();
    assert_eq!(chapter.title, "Chapter 1: Introduction");
    assert_eq!(chapter.kind, LineKind::Chapter);

    let fever = output
        .toc
        .nodes()
        .iter()
        .find(|node| node.level == 4)
        .unwrap();
    assert_eq!(fever.title, "FEVER MANAGEMENT");
    assert_eq!(fever.parent_id, Some(chapter.id));

    let record = output
        .records
        .iter()
        .find(|r| r.entities.get(EntityCategory::Drugs).contains(&"acetaminophen".to_string()))
        .unwrap();
    assert!(record.text.contains("10-15 mg/kg"));
    assert_eq!(record.chapter_title.as_deref(), Some("Chapter 1: Introduction"));
    assert_eq!(record.chapter_id, Some(chapter.id));
    assert_eq!(
        record.subsection_path,
        "Chapter 1: Introduction > FEVER MANAGEMENT"
    );
    assert_eq!(record.chunk_id, "NELSON_000001");
    assert!(record.dosages.contains(&"15 mg/kg".to_string()));
}

#[test]
fn three_block_section_closes_after_second_block() {
    let text = [
        repeated("alpha", 500),
        repeated("bravo", 900),
        repeated("charlie", 500),
    ]
    .concat();
    let raw = RawText::from_text(&text).unwrap();
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&raw);

    assert_eq!(output.records.len(), 2);
    let (first, second) = (&output.records[0], &output.records[1]);
    assert_eq!(first.token_estimate, 1400);
    assert!(!first.text.contains("charlie"));

    // The trailing 900-word block is re-included whole
    assert!(second.text.starts_with("bravo"));
    assert_eq!(second.token_estimate, 1400);
    assert!(second.start_offset < first.end_offset);
    assert_eq!(second.end_offset, raw.len());
    assert_eq!(second.chunk_index_in_section, 1);
}

#[test]
fn giant_block_exceeds_ceiling_instead_of_splitting() {
    let text = [repeated("table", 1500), repeated("note", 100)].concat();
    let raw = RawText::from_text(&text).unwrap();
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&raw);

    let sizes: Vec<usize> = output.records.iter().map(|r| r.token_estimate).collect();
    assert_eq!(sizes, vec![1500, 1600]);
    assert_eq!(output.records[0].start_offset, output.records[1].start_offset);
}

#[test]
fn giant_table_followed_by_short_blocks_is_not_repeated() {
    let mut text = repeated("table", 1500);
    for _ in 0..20 {
        text.push_str(&repeated("note", 10));
    }
    let raw = RawText::from_text(&text).unwrap();
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&raw);

    let spans: Vec<(usize, usize)> = output
        .records
        .iter()
        .map(|r| (r.start_offset, r.token_estimate))
        .collect();
    assert_eq!(spans, vec![(0, 1500), (0, 1700)]);
    assert_eq!(output.records[1].end_offset, raw.len());
    assert_eq!(
        output
            .manifest
            .warnings
            .iter()
            .filter(|w| w.contains("oversized"))
            .count(),
        1
    );
}

#[test]
fn offsets_are_contiguous_and_exhaustive() {
    let (raw, output) = run_book();
    let nodes = output.toc.nodes();
    assert!(!nodes.is_empty());

    for pair in nodes.windows(2) {
        assert_eq!(pair[0].end_offset, pair[1].start_offset);
    }
    assert_eq!(nodes.last().map(|n| n.end_offset), Some(raw.len()));
}

#[test]
fn toc_levels_and_parents() {
    let (_, output) = run_book();
    let nodes = output.toc.nodes();

    let levels: HashSet<u8> = nodes.iter().map(|n| n.level).collect();
    assert_eq!(levels, HashSet::from([1, 2, 3, 4, 5]));

    for node in nodes {
        if let Some(parent) = node.parent_id.and_then(|id| output.toc.get(id)) {
            assert!(parent.level < node.level);
            assert!(parent.start_offset < node.start_offset);
        }
        if node.level == 1 {
            assert_eq!(node.parent_id, None);
            assert!(node.title.ends_with(" Foundations Of Care"), "{}", node.title);
        }
    }

    // A title-case heading right under a chapter hangs off the chapter, and
    // the next all-caps heading climbs back out of it
    let charts: Vec<_> = nodes.iter().filter(|n| n.level == 5).collect();
    assert_eq!(charts.len(), 4);
    for chart in charts {
        assert_eq!(chart.title, "Growth Charts");
        let parent = chart.parent_id.and_then(|id| output.toc.get(id)).unwrap();
        assert_eq!(parent.level, 2);
        let next = nodes.iter().find(|n| n.start_offset > chart.start_offset).unwrap();
        assert_eq!(next.level, 4);
        assert_eq!(next.parent_id, Some(parent.id));
    }
}

#[test]
fn leaves_are_exactly_the_unreferenced_nodes() {
    let (_, output) = run_book();
    let parents: HashSet<NodeId> = output.toc.nodes().iter().filter_map(|n| n.parent_id).collect();
    let leaves = resolve_leaves(&output.toc);

    for node in output.toc.nodes() {
        let is_leaf = leaves.iter().any(|leaf| leaf.id == node.id);
        assert_eq!(is_leaf, !parents.contains(&node.id), "{}", node.title);
    }
    for pair in leaves.windows(2) {
        assert!(pair[0].end_offset <= pair[1].start_offset);
    }
}

#[test]
fn record_text_is_an_exact_slice() {
    let (raw, output) = run_book();
    assert!(!output.records.is_empty());
    for record in &output.records {
        assert_eq!(
            record.text.as_str(),
            &raw.as_str()[record.start_offset..record.end_offset]
        );
        assert_eq!(record.token_estimate, word_count(&record.text));
        assert!(!record.text.trim().is_empty());
    }
}

#[test]
fn chunk_boundaries_fall_between_blocks() {
    let (raw, output) = run_book();
    let text = raw.as_str();
    let node_starts: HashSet<usize> = output.toc.nodes().iter().map(|n| n.start_offset).collect();
    let at_block_edge = |offset: usize| {
        offset == 0
            || offset == text.len()
            || node_starts.contains(&offset)
            || text[..offset].ends_with("\n\n")
    };

    for record in &output.records {
        assert!(at_block_edge(record.start_offset), "{} start", record.chunk_id);
        assert!(at_block_edge(record.end_offset), "{} end", record.chunk_id);
    }
}

#[test]
fn budget_floor_holds_except_for_last_chunk() {
    let (_, output) = run_book();
    let config = ChunkingConfig::compact();

    let mut closed_chunks = 0;
    for run in section_runs(&output.records) {
        for record in &run[..run.len() - 1] {
            closed_chunks += 1;
            assert!(
                record.token_estimate >= config.min_chunk_words,
                "{} has {} words",
                record.chunk_id,
                record.token_estimate
            );
        }
    }
    assert!(closed_chunks > 0, "book should force at least one split");
}

#[test]
fn consecutive_chunks_in_a_section_overlap() {
    let (_, output) = run_book();
    for run in section_runs(&output.records) {
        for pair in run.windows(2) {
            assert!(pair[1].start_offset < pair[0].end_offset);
            assert_eq!(pair[1].section_id, pair[0].section_id);
            assert_eq!(pair[1].chunk_index_in_section, pair[0].chunk_index_in_section + 1);
        }
    }
}

#[test]
fn chunk_ids_are_unique_and_increasing() {
    let (_, output) = run_book();
    let ids: Vec<&str> = output.records.iter().map(|r| r.chunk_id.as_str()).collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(id.to_string(), format!("NELSON_{:06}", i + 1));
    }
}

#[test]
fn small_sections_merge_within_their_chapter() {
    let (_, output) = run_book();
    let merged: Vec<&ChunkRecord> = output
        .records
        .iter()
        .filter(|r| r.merged_section_ids.len() > 1)
        .collect();
    assert!(!merged.is_empty());

    for record in merged {
        let chapters: HashSet<Option<NodeId>> = record
            .merged_section_ids
            .iter()
            .map(|id| output.toc.chapter_of(*id).map(|c| c.id))
            .collect();
        assert_eq!(chapters.len(), 1);
        assert_eq!(record.merged_section_ids.last().copied(), record.section_id);
    }
}

#[test]
fn content_types_and_metadata_flow_through() {
    let (_, output) = run_book();
    let all_kinds: HashSet<_> = output
        .records
        .iter()
        .flat_map(|r| r.content_types.iter().copied())
        .collect();
    assert!(all_kinds.len() >= 4, "{all_kinds:?}");

    assert_eq!(output.manifest.book.edition.as_deref(), Some("21"));
    assert_eq!(output.manifest.book.year.as_deref(), Some("2020"));
    assert_eq!(output.manifest.stats.total_chunks, output.records.len());
}

#[test]
fn pipeline_is_idempotent() {
    let (_, first) = run_book();
    let (_, second) = run_book();
    assert_eq!(
        serde_json::to_string(&first.records).unwrap(),
        serde_json::to_string(&second.records).unwrap()
    );
    assert_eq!(first.toc, second.toc);
    assert_eq!(first.manifest, second.manifest);
}

#[test]
fn empty_toc_falls_back_to_one_section() {
    let raw = RawText::from_text("just some lowercase prose about fever.\n\nand a second block.\n")
        .unwrap();
    let output = compact_pipeline().run(&raw);

    assert!(output.toc.is_empty());
    assert_eq!(output.records.len(), 1);
    let record = &output.records[0];
    assert_eq!(record.section_title, WHOLE_DOCUMENT_TITLE);
    assert_eq!(record.section_id, None);
    assert_eq!((record.start_offset, record.end_offset), (0, raw.len()));
    assert!(output
        .manifest
        .warnings
        .iter()
        .any(|w| w.starts_with("No headings detected")));
}

#[test]
fn parts_are_concatenated_and_missing_ones_reported() {
    let raw = RawText::builder()
        .push_part("part1.txt", b"Chapter 1\nIntro\n\nbody text")
        .skip_part("part2.txt", "No such file")
        .push_part("part3.txt", b"\nFEVER MANAGEMENT\n\nmore body text\n")
        .build()
        .unwrap();
    assert!(raw.as_str().contains("body text\n\nFEVER MANAGEMENT"));

    let output = compact_pipeline().run(&raw);
    assert_eq!(output.manifest.parts.len(), 2);
    assert_eq!(output.manifest.parts[1].start, output.manifest.parts[0].end);
    assert_eq!(output.manifest.warnings[0], "Part part2.txt skipped: No such file");
    assert_eq!(output.toc.len(), 2);
}
