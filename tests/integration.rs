use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use figmap::core::model::{AssetMap, LaneTexts, MatchMethod};
use figmap::input::{build_page_index, parse_content_list};
use figmap::pipeline::{build_figure_map, load_inputs, DocumentInputs, InputPaths, PipelineConfig};
use figmap::references::{dedup_references, ReferenceExtractor};

fn temp_output_dir(prefix: &str) -> PathBuf {
    let mut out = std::env::temp_dir();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let pid = std::process::id();
    out.push(format!("{prefix}-{pid}-{now}"));
    out
}

fn span_block(kind: &str, bbox: [f32; 4], text: &str) -> Value {
    json!({
        "type": kind,
        "bbox": bbox,
        "lines": [{"spans": [{"content": text, "bbox": bbox}]}]
    })
}

fn image_with_caption(bbox: [f32; 4], caption: &str) -> Value {
    json!({
        "type": "image",
        "bbox": bbox,
        "lines": [],
        "blocks": [
            {"type": "image_body", "bbox": bbox, "lines": []},
            span_block("image_caption", [bbox[0], bbox[3], bbox[2], bbox[3] + 20.0], caption)
        ]
    })
}

fn inputs(content_list: Value, middle: Value, lanes: Option<LaneTexts>) -> Result<DocumentInputs> {
    Ok(DocumentInputs {
        content_list: parse_content_list(content_list)?,
        pages: build_page_index(&middle)?,
        lane_texts: lanes,
        assets: AssetMap::new(),
    })
}

fn lanes(pairs: &[(&str, &str)]) -> LaneTexts {
    pairs
        .iter()
        .map(|(lane, text)| (lane.to_string(), text.to_string()))
        .collect()
}

/// A three-page paper: a figure with its citation, a far-away citation and a table.
fn sample_document() -> Result<DocumentInputs> {
    let sentence = "As shown in Fig. 2, the model stacks six attention layers.";
    inputs(
        json!([
            "Running header",
            {"type": "title", "text": "Model Design", "page_idx": 3},
            {"type": "image", "img_caption": ["Figure 2: Model architecture"], "img_path": "images/arch.jpg", "page_idx": 3},
            {"type": "text", "text": sentence, "page_idx": 3},
            {"type": "table", "table_caption": ["Table 1: Scores on", "the benchmark"], "img_path": "images/scores.jpg", "page_idx": 4},
            {"type": "text", "text": "Fig. 2 also explains the latency numbers we report.", "page_idx": 5},
            {"type": "image", "img_caption": ["Fig. 9 Results"], "img_path": "assets/fig9.png", "page_idx": 4}
        ]),
        json!({"pdf_info": [
            {
                "page_idx": 3,
                "preproc_blocks": [
                    span_block("title", [50.0, 40.0, 400.0, 60.0], "Model Design"),
                    image_with_caption([50.0, 80.0, 500.0, 380.0], "Figure 2: Model architecture")
                ],
                "para_blocks": [
                    span_block("text", [50.0, 420.0, 500.0, 460.0], sentence)
                ]
            },
            {
                "page_idx": 4,
                "preproc_blocks": [
                    {"type": "table", "bbox": [50.0, 60.0, 500.0, 300.0], "lines": [], "blocks": [
                        span_block("table_caption", [50.0, 40.0, 500.0, 58.0], "Table 1: Scores on the benchmark")
                    ]}
                ],
                "para_blocks": [
                    span_block("text", [50.0, 320.0, 500.0, 340.0], "An unrelated paragraph about training budgets.")
                ]
            }
        ]}),
        None,
    )
}

#[test]
fn merged_records_preserve_count_and_order() -> Result<()> {
    let document = sample_document()?;
    let result = build_figure_map(&PipelineConfig::default(), &document);

    assert_eq!(result.merged.len(), document.content_list.len());
    for (record, item) in result.merged.iter().zip(&document.content_list) {
        assert_eq!(&record.item, item);
    }

    // plain strings and items on pages missing from the index stay unmatched
    assert_eq!(result.merged[0].match_method, MatchMethod::NoMatch);
    assert_eq!(result.merged[5].match_method, MatchMethod::NoMatch);
    Ok(())
}

#[test]
fn accepted_matches_respect_thresholds() -> Result<()> {
    let result = build_figure_map(&PipelineConfig::default(), &sample_document()?);
    for record in &result.merged {
        match record.match_method {
            MatchMethod::Similarity(_) => assert!(record.match_confidence > 0.6),
            MatchMethod::Caption(_, _) => assert!(record.match_confidence > 0.2),
            MatchMethod::NumberFallback(_, _) => assert_eq!(record.match_confidence, 0.8),
            MatchMethod::NoMatch => assert_eq!(record.match_confidence, 0.0),
        }
    }

    let caption = &result.merged[2];
    assert_eq!(caption.match_method.to_string(), "image_caption_preproc_blocks");
    assert_eq!(caption.middle_type.as_deref(), Some("image_caption"));
    assert!(caption.type_matched);

    let table = &result.merged[4];
    assert_eq!(table.match_method.to_string(), "table_caption_preproc_blocks");
    assert_eq!(table.item.caption, "Table 1: Scores on the benchmark");

    let text = &result.merged[3];
    assert_eq!(text.match_method.to_string(), "para_blocks_similarity");
    assert_eq!(text.bbox.map(|b| b.y0), Some(420.0));
    Ok(())
}

#[test]
fn unmatched_image_has_zero_confidence() -> Result<()> {
    let result = build_figure_map(&PipelineConfig::default(), &sample_document()?);
    let record = serde_json::to_value(&result.merged[6])?;

    assert_eq!(record["match_confidence"], 0.0);
    assert_eq!(record["match_method"], "no_match");
    assert_eq!(record["bbox"], Value::Null);
    assert_eq!(record["caption"], "Fig. 9 Results");
    Ok(())
}

#[test]
fn same_page_citation_has_full_weight() -> Result<()> {
    let result = build_figure_map(&PipelineConfig::default(), &sample_document()?);
    let figure = result
        .matching
        .results
        .iter()
        .find(|r| r.figure_id == "arch")
        .expect("figure 2 is extracted");

    assert_eq!(figure.page_idx, 3);
    assert_eq!(figure.matches.len(), 2);
    assert_eq!(
        figure.matches[0].reference_text,
        "As shown in Fig. 2, the model stacks six attention layers."
    );
    assert_eq!(figure.matches[0].position_weight, 1.0);
    assert_eq!(figure.matches[0].page_distance, 0);

    // the second citation sits two pages later
    assert_eq!(figure.matches[1].page_distance, 2);
    assert_eq!(figure.matches[1].position_weight, 0.6);
    assert_eq!(figure.matches[1].confidence_score, 0.6);
    Ok(())
}

#[test]
fn far_page_citation_is_down_weighted() -> Result<()> {
    let document = inputs(
        json!([
            {"type": "image", "img_caption": "Figure 4: Ablations", "img_path": "f4.png", "page_idx": 5},
            {"type": "text", "text": "The ablations in Figure 4 confirm the design.", "page_idx": 7}
        ]),
        json!({"pdf_info": []}),
        None,
    )?;
    let result = build_figure_map(&PipelineConfig::default(), &document);

    let matches = &result.matching.results[0].matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].page_distance, 2);
    assert_eq!(matches[0].position_weight, 0.6);
    Ok(())
}

#[test]
fn repeated_table_sentence_is_matched_once() -> Result<()> {
    let sentence = "Table 1 lists the scores, see Tab. 1 for details.";
    let document = inputs(
        json!([
            {"type": "table", "table_caption": "Table 1: Scores", "img_path": "t1.png", "page_idx": 1},
            {"type": "text", "text": sentence, "page_idx": 1},
            {"type": "text", "text": sentence, "page_idx": 2}
        ]),
        json!({"pdf_info": []}),
        None,
    )?;
    let result = build_figure_map(&PipelineConfig::default(), &document);

    assert_eq!(result.matching.total_figures, 1);
    assert_eq!(result.matching.total_matches, 1);
    assert_eq!(result.matching.results[0].matches[0].page_distance, 0);
    Ok(())
}

#[test]
fn matches_are_sorted_by_weight() -> Result<()> {
    let result = build_figure_map(&PipelineConfig::default(), &sample_document()?);
    for figure in &result.matching.results {
        for pair in figure.matches.windows(2) {
            assert!(pair[0].position_weight >= pair[1].position_weight);
        }
    }

    // nothing in the text cites figure 9
    let fig9 = result
        .matching
        .results
        .iter()
        .find(|r| r.figure_id == "fig9")
        .expect("fig9 is extracted");
    assert!(fig9.matches.is_empty());
    Ok(())
}

#[test]
fn extraction_dedup_is_idempotent() {
    let extractor = ReferenceExtractor::default();
    let text = "Figure 3 and Fig. 3 show it. As seen in Table 2, scores rise. 如图3所示，效果更好。";

    let once = dedup_references(extractor.extract(text));
    let mut twice = extractor.extract(text);
    twice.extend(extractor.extract(text));
    let twice = dedup_references(dedup_references(twice));

    assert_eq!(once, twice);
}

#[test]
fn caption_found_in_one_lane_is_assigned_there() -> Result<()> {
    let document = inputs(
        json!([
            {"type": "image", "img_caption": ["Figure 1: Overview of the pipeline"], "img_path": "images/f1.jpg", "page_idx": 0},
            {"type": "image", "img_caption": ["Figure 5: Never discussed"], "img_path": "images/f5.jpg", "page_idx": 0},
            {"type": "text", "text": "Figure 1 gives an overview of every stage.", "page_idx": 0}
        ]),
        json!({"pdf_info": [{"preproc_blocks": [], "para_blocks": []}]}),
        Some(lanes(&[
            ("Context & Related Work", "Prior work uses hand-written rules."),
            ("Methodology & Setup", "We first describe the system. Overview of the pipeline. It has three stages."),
            ("Results & Analysis", "Scores improve across the board."),
            ("Conclusion", ""),
        ])),
    )?;
    let result = build_figure_map(&PipelineConfig::default(), &document);
    let figure_map = result.figure_map.expect("lane texts were given");

    let names: Vec<&str> = figure_map.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "Context & Related Work",
            "Methodology & Setup",
            "Results & Analysis",
            "Conclusion"
        ]
    );
    let methodology = &figure_map["Methodology & Setup"];
    assert_eq!(methodology.len(), 1);
    assert_eq!(methodology[0].figure_id, "f1");
    assert_eq!(
        methodology[0].reference_text,
        vec!["Figure 1 gives an overview of every stage."]
    );

    // each figure lands in at most one lane
    let assigned: Vec<&str> = figure_map
        .values()
        .flatten()
        .map(|entry| entry.figure_id.as_str())
        .collect();
    assert_eq!(assigned, vec!["f1"]);
    Ok(())
}

#[test]
fn loads_inputs_from_files() -> Result<()> {
    let dir = temp_output_dir("figmap-inputs");
    fs::create_dir_all(&dir)?;

    let content_list = dir.join("content_list.json");
    // the parser sometimes emits the list as a JSON-encoded string
    let encoded = serde_json::to_string(&json!([
        {"type": "text", "text": "A short paragraph of text.", "page_idx": 0}
    ]))?;
    fs::write(&content_list, serde_json::to_string(&encoded)?)?;
    let middle = dir.join("middle.json");
    fs::write(&middle, json!({"pdf_info": [{"para_blocks": []}]}).to_string())?;
    let lane_file = dir.join("lanes.json");
    fs::write(&lane_file, json!({"Conclusion": "done", "Appendix": "more"}).to_string())?;

    let paths = InputPaths {
        content_list: content_list.clone(),
        middle: middle.clone(),
        lanes: Some(lane_file),
        assets: None,
    };
    let loaded = load_inputs(&paths)?;
    assert_eq!(loaded.content_list.len(), 1);
    assert!(loaded.pages.contains_key(&0));

    let ordered = PipelineConfig::default().order_lanes(loaded.lane_texts.unwrap_or_default());
    let names: Vec<&str> = ordered.keys().map(String::as_str).collect();
    assert_eq!(names.len(), 5);
    assert_eq!(names[4], "Appendix");

    fs::write(&middle, json!({"pages": []}).to_string())?;
    let err = load_inputs(&InputPaths {
        content_list,
        middle,
        lanes: None,
        assets: None,
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("pdf_info"));

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}
