// tests/scoring_scenarios.rs
//
// End-to-end scoring through the public engine API:
// - single-select / multi-select scenarios
// - antipattern with and without reverse items
// - weakness precedence over strength in the row split
// - inversion routing and idempotence

use potential_matrix::config::InvertPolicy;
use potential_matrix::{EngineConfig, Report, ScoringEngine};
use serde_json::{json, Value};

const EPS: f64 = 1e-9;

fn engine() -> ScoringEngine {
    ScoringEngine::with_defaults()
}

fn one_block(questions: Value) -> Value {
    json!({ "blocks": [{ "block_id": "main", "questions": questions }] })
}

fn untouched_except(report: &Report, except: &[&str]) {
    for (id, s) in &report.scores {
        if except.contains(&id.as_str()) {
            continue;
        }
        assert_eq!(s.strength, 0.0, "{id} strength changed");
        assert_eq!(s.weakness, 0.0, "{id} weakness changed");
        assert!(s.columns.values().all(|v| *v == 0.0), "{id} columns changed");
    }
}

#[test]
fn single_select_credits_strength_and_dimension() {
    let bank = one_block(json!([{
        "id": "q1", "type": "single_select", "weight": 1.0, "column": "perception",
        "options": [
            {"id": "opt_a", "label": "Notice details", "potential": "emerald"},
            {"id": "opt_b", "label": "Feel the room", "potential": "amber"}
        ]
    }]));
    let report = engine()
        .score(&bank, &json!({"answers": {"q1": "opt_a"}}))
        .expect("score");

    let p = &report.scores["emerald"];
    assert!((p.strength - 1.0).abs() < EPS);
    assert!((p.columns["perception"] - 1.0).abs() < EPS);
    assert_eq!(p.dominant_column, "perception");
    untouched_except(&report, &["emerald"]);
}

#[test]
fn multi_select_splits_weight_evenly() {
    let bank = one_block(json!([{
        "id": "q1", "type": "multi_select", "weight": 2.0, "column": "motivation"
    }]));
    let report = engine()
        .score(&bank, &json!({"answers": {"q1": ["ruby", "Сапфир"]}}))
        .expect("score");

    assert!((report.scores["ruby"].strength - 1.0).abs() < EPS);
    assert!((report.scores["sapphire"].strength - 1.0).abs() < EPS);
    let total: f64 = report.scores.values().map(|s| s.strength).sum();
    assert!((total - 2.0).abs() < EPS, "weight not conserved: {total}");
    untouched_except(&report, &["ruby", "sapphire"]);
}

#[test]
fn multi_select_conserves_weight_for_any_selection_size() {
    let all = ["amber", "shungite", "citrine", "emerald", "ruby", "garnet", "sapphire", "heliodor", "amethyst"];
    for n in 1..=all.len() {
        let bank = one_block(json!([{"id": "q", "type": "multi_select", "weight": 3.5, "column": "instrument"}]));
        let report = engine()
            .score(&bank, &json!({"answers": {"q": &all[..n]}}))
            .expect("score");
        let total: f64 = report.scores.values().map(|s| s.strength).sum();
        let col: f64 = report.scores.values().map(|s| s.columns["instrument"]).sum();
        assert!((total - 3.5).abs() < EPS, "n={n}: {total}");
        assert!((col - 3.5).abs() < EPS, "n={n}: {col}");
    }
}

#[test]
fn antipattern_adds_weakness() {
    let bank = one_block(json!([{
        "id": "ap1", "antipattern": true, "anti_weight_multiplier": 0.8, "column": "perception"
    }]));
    let report = engine()
        .score(&bank, &json!({"answers": {"ap1": "garnet"}}))
        .expect("score");

    let g = &report.scores["garnet"];
    assert!((g.weakness - 0.8).abs() < EPS);
    assert_eq!(g.strength, 0.0);
    assert_eq!(g.columns["perception"], 0.0);
}

#[test]
fn reverse_antipattern_item_is_floored_to_zero() {
    let bank = json!({
        "blocks": [{
            "block_id": "anti",
            "scoring_rules": {"antipattern": true, "anti_weight_multiplier": 0.8, "reverse_items": ["ap1"]},
            "questions": [{"id": "ap1"}]
        }]
    });
    let report = engine()
        .score(&bank, &json!({"answers": {"ap1": "garnet"}}))
        .expect("score");

    let g = &report.scores["garnet"];
    assert_eq!(g.weakness, 0.0);
    assert!(g.weakness.is_sign_positive());
}

#[test]
fn reverse_item_offsets_earlier_weakness() {
    let bank = json!({
        "blocks": [{
            "scoring_rules": {"antipattern": true, "reverse_items": ["ap2"]},
            "questions": [
                {"id": "ap1", "weight": 2.0},
                {"id": "ap2", "weight": 0.5}
            ]
        }]
    });
    let report = engine()
        .score(&bank, &json!({"answers": {"ap1": "citrine", "ap2": "citrine"}}))
        .expect("score");
    assert!((report.scores["citrine"].weakness - 1.5).abs() < EPS);
}

#[test]
fn inverted_question_only_moves_weakness() {
    let bank = one_block(json!([
        {"id": "n1", "type": "multi_select", "weight": 2.0, "column": "perception"},
        {"id": "i1", "type": "multi_select", "weight": 2.0, "column": "perception", "invert_score": true}
    ]));
    let base = engine()
        .score(&bank, &json!({"answers": {"n1": ["ruby", "amber"]}}))
        .expect("score");
    let with_inverted = engine()
        .score(&bank, &json!({"answers": {"n1": ["ruby", "amber"], "i1": ["ruby", "heliodor"]}}))
        .expect("score");

    for (id, s) in &base.scores {
        let t = &with_inverted.scores[id];
        assert_eq!(s.strength, t.strength, "{id} strength moved");
        assert_eq!(s.columns, t.columns, "{id} columns moved");
    }
    // 2.0 / 2 * 0.8
    assert!((with_inverted.scores["ruby"].weakness - 0.8).abs() < EPS);
    assert!((with_inverted.scores["heliodor"].weakness - 0.8).abs() < EPS);
}

#[test]
fn strength_penalty_policy_is_configurable() {
    let mut config = EngineConfig::default();
    config.policy.invert_routing = InvertPolicy::StrengthPenalty;
    let engine = ScoringEngine::new(config).expect("engine");

    let bank = one_block(json!([{"id": "i1", "column": "motivation", "invert": true}]));
    let report = engine
        .score(&bank, &json!({"answers": {"i1": "amethyst"}}))
        .expect("score");
    let a = &report.scores["amethyst"];
    assert!((a.strength + 0.8).abs() < EPS);
    assert_eq!(a.weakness, 0.0);
    assert_eq!(a.columns["motivation"], 0.0);
}

#[test]
fn weakness_tier_wins_over_high_strength() {
    let order = ["amber", "shungite", "citrine", "emerald", "ruby", "garnet", "sapphire", "heliodor", "amethyst"];
    let mut questions = Vec::new();
    let mut answers = serde_json::Map::new();
    for (i, id) in order.iter().enumerate() {
        let s = format!("s_{id}");
        let w = format!("w_{id}");
        questions.push(json!({"id": s, "weight": 10.0 + i as f64, "column": "perception"}));
        questions.push(json!({"id": w, "weight": 1.0 + i as f64, "antipattern": true}));
        answers.insert(s, json!(id));
        answers.insert(w, json!(id));
    }
    let report = engine()
        .score(&one_block(Value::Array(questions)), &json!({"answers": answers}))
        .expect("score");

    // The three highest-weakness potentials also have the highest strength.
    assert_eq!(report.rows.row3_weaknesses, ["amethyst", "heliodor", "sapphire"]);
    assert_eq!(report.rows.row1_strengths, ["garnet", "ruby", "emerald"]);
    for top in &report.rows.row3_weaknesses {
        assert!(!report.rows.row1_strengths.contains(top));
    }
}

#[test]
fn paired_question_rewards_fast_and_penalizes_slow() {
    let bank = one_block(json!([{
        "id": "fs1", "type": "fast_slow", "weight": 2.0, "column": "instrument"
    }]));
    let report = engine()
        .score(&bank, &json!({"answers": {"fs1": {"fast": ["ruby"], "slow": ["amber", "citrine"]}}}))
        .expect("score");
    assert!((report.scores["ruby"].strength - 2.0).abs() < EPS);
    assert!((report.scores["ruby"].columns["instrument"] - 2.0).abs() < EPS);
    // 2.0 * 0.5 / 2
    assert!((report.scores["amber"].strength + 0.5).abs() < EPS);
    assert_eq!(report.scores["amber"].columns["instrument"], 0.0);
}

#[test]
fn typos_and_positional_options_resolve() {
    let bank = one_block(json!([
        {"id": "q1", "column": "perception"},
        {"id": "q2", "column": "motivation", "options": ["amber", "citrine", "ruby"]}
    ]));
    let report = engine()
        .score(&bank, &json!({"answers": {"q1": "Izumrud", "q2": "option_3"}}))
        .expect("score");
    assert!((report.scores["emerald"].strength - 1.0).abs() < EPS);
    assert!((report.scores["ruby"].columns["motivation"] - 1.0).abs() < EPS);
    assert_eq!(report.meta.unresolved_tokens, 0);
}

#[test]
fn identical_inputs_give_identical_bytes() {
    let bank = one_block(json!([
        {"id": "q1", "type": "multi_select", "weight": 1.5, "column": "perception"},
        {"id": "q2", "type": "text", "column": "motivation",
         "keywords": {"ruby": ["lead", "drive"], "amber": ["calm"]}},
        {"id": "q3", "antipattern": true}
    ]));
    let answers = json!({
        "respondent_id": "r-7",
        "answers": {
            "q1": ["ruby", "amber", "heliodor"],
            "q2": {"text": "I lead and drive, staying calm"},
            "q3": "shungite"
        }
    });
    let a = engine().score(&bank, &answers).expect("score").to_json_pretty().unwrap();
    let b = engine().score(&bank, &answers).expect("score").to_json_pretty().unwrap();
    assert_eq!(a, b);
}

#[test]
fn unanswered_and_empty_answers_are_noops() {
    let bank = one_block(json!([{"id": "q1", "column": "perception"}]));
    for answers in [json!({}), json!({"answers": {"q1": null}}), json!({"answers": {"q1": ""}})] {
        let report = engine().score(&bank, &answers).expect("score");
        untouched_except(&report, &[]);
    }
}

#[test]
fn undimensioned_question_adds_strength_only() {
    let bank = one_block(json!([{"id": "q1", "type": "single_select", "weight": 1.5}]));
    let report = engine()
        .score(&bank, &json!({"answers": {"q1": "citrine"}}))
        .expect("score");

    let c = &report.scores["citrine"];
    assert!((c.strength - 1.5).abs() < EPS);
    assert_eq!(c.weakness, 0.0);
    assert!(c.columns.values().all(|v| *v == 0.0), "{:?}", c.columns);
    assert_eq!(report.meta.undimensioned_questions, 1);
    untouched_except(&report, &["citrine"]);
}

#[test]
fn overflowing_weights_stay_numeric_in_json() {
    let bank = one_block(json!([
        {"id": "q1", "weight": 1e308, "column": "perception"},
        {"id": "q2", "weight": 1e308, "column": "perception"},
        {"id": "q3", "type": "fast_slow", "weight": 1e308, "slow_factor": 1e308}
    ]));
    let answers = json!({"answers": {
        "q1": "ruby",
        "q2": "ruby",
        "q3": {"fast": ["garnet"], "slow": ["amber"]}
    }});
    let report = engine().score(&bank, &answers).expect("score");

    assert_eq!(report.scores["ruby"].strength, f64::MAX);
    assert_eq!(report.scores["ruby"].columns["perception"], f64::MAX);
    assert_eq!(report.scores["amber"].strength, -f64::MAX);

    let v = serde_json::to_value(&report).expect("json");
    for (id, s) in v["scores"].as_object().expect("scores") {
        assert!(s["strength"].is_number(), "{id} strength: {}", s["strength"]);
        assert!(s["weakness"].is_number(), "{id} weakness: {}", s["weakness"]);
        for (dim, n) in s["columns"].as_object().expect("columns") {
            assert!(n.is_number(), "{id}/{dim}: {n}");
        }
    }
    assert_eq!(report.rows.row1_strengths[0], "ruby");
}
