//! Integration tests for the differential-expression workflow.

use proteo_dea::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Deterministic uniform draw in [0, 1).
fn simple_rand(seed: &mut u64) -> f64 {
    *seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
    ((*seed >> 16) & 0x7FFF) as f64 / 32768.0
}

const N_SAMPLES: usize = 16;
const N_PROTEINS: usize = 44;

/// Base intensity per protein. The up-regulated proteins (P00-P03) and the
/// down-regulated proteins (P04-P07) occupy exactly swapped intensity ranges
/// in Dementia-AD samples, so every sample keeps the same marginal intensity
/// distribution and quantile normalization stays faithful to the effects.
fn base_intensity(p: usize) -> f64 {
    match p {
        0..=3 => 500.0 + 50.0 * p as f64,
        4..=7 => 2000.0 + 200.0 * (p - 4) as f64,
        42 => 2680.0,
        43 => 2740.0,
        _ => 520.0 + 45.0 * (p - 8) as f64,
    }
}

/// Create synthetic abundance data with known diagnosis effects.
///
/// 16 samples, 4 per diagnosis level (Normal, Dementia-AD, Resilient,
/// Frail), 44 proteins:
/// - P00-P03: 4x up in Dementia-AD
/// - P04-P07: 4x down in Dementia-AD (mirroring P00-P03's intensity range)
/// - P08-P41: no effect
/// - P42: 5 missing values (dropped at max_missing = 3)
/// - P43: 2 missing values (kept, imputed)
fn create_synthetic_abundance() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    write!(file, "accession\tgene\tdescription").unwrap();
    for i in 0..N_SAMPLES {
        write!(file, "\tS{:02}", i).unwrap();
    }
    writeln!(file).unwrap();

    let mut seed = 42u64;
    for p in 0..N_PROTEINS {
        write!(file, "P{:02}\tGENE{}\tprotein {}", p, p, p).unwrap();
        for i in 0..N_SAMPLES {
            let is_ad = (4..8).contains(&i);
            let missing =
                (p == 42 && i % 2 == 0 && i < 10) || (p == 43 && (i == 1 || i == 9));
            if missing {
                write!(file, "\tNA").unwrap();
                continue;
            }
            let effect = if is_ad && p < 4 {
                4.0
            } else if is_ad && (4..8).contains(&p) {
                0.25
            } else {
                1.0
            };
            // ±20% noise: wide enough that neighboring proteins trade rank
            // positions between samples, so no response is rank-constant
            // after quantile normalization.
            let noise = 0.8 + 0.4 * simple_rand(&mut seed);
            write!(file, "\t{:.3}", base_intensity(p) * effect * noise).unwrap();
        }
        writeln!(file).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Metadata matching the synthetic abundance: diagnosis in blocks of four,
/// covariates irregular enough to keep the design well-conditioned.
fn create_synthetic_metadata() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sample_id\tdiagnosis\tsex\teducation\tage_death\tpmi").unwrap();
    let diagnoses = ["Normal", "Dementia-AD", "Resilient", "Frail"];
    for i in 0..N_SAMPLES {
        let dx = diagnoses[i / 4];
        let sex = if i % 2 == 0 { "female" } else { "male" };
        let education = 8.0 + (i * 7 % 9) as f64 * 0.5;
        let age_death = 80.0 + (i * 5 % 13) as f64;
        let pmi = 300.0 + (i * 23 % 97) as f64;
        writeln!(
            file,
            "S{:02}\t{}\t{}\t{}\t{}\t{}",
            i, dx, sex, education, age_death, pmi
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

fn load_inputs() -> (AbundanceMatrix, ProteinAnnotations, SampleMetadata) {
    let abundance_file = create_synthetic_abundance();
    let metadata_file = create_synthetic_metadata();
    let (matrix, annotations) = AbundanceMatrix::from_tsv(abundance_file.path()).unwrap();
    let metadata = SampleMetadata::from_tsv(metadata_file.path()).unwrap();
    (matrix, annotations, metadata)
}

#[test]
fn test_standard_workflow_contrast_completeness() {
    let (matrix, annotations, metadata) = load_inputs();
    let results = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap();

    // P42 dropped: 43 proteins × 6 contrasts.
    assert_eq!(results.len(), 43 * 6);
    let names = results.contrast_names();
    assert_eq!(names.len(), 6);
    for name in &names {
        assert_eq!(results.for_contrast(name).len(), 43);
    }
    assert!(results.get("P42", "Dementia-AD_over_Normal").is_none());
    assert!(results.get("P43", "Dementia-AD_over_Normal").is_some());
}

#[test]
fn test_strong_effects_detected_with_direction() {
    let (matrix, annotations, metadata) = load_inputs();
    let results = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap();

    for p in 0..4 {
        let acc = format!("P{:02}", p);
        let r = results.get(&acc, "Dementia-AD_over_Normal").unwrap();
        assert!(
            r.significant,
            "{} should be significant, padj = {}",
            acc, r.p_adj
        );
        assert_eq!(r.direction, Some(Direction::Increase));
        // 4x effect is 2 on the log2 scale; quantile normalization bends it
        // a little.
        assert!((r.log_fc - 2.0).abs() < 0.6, "logFC = {}", r.log_fc);

        // The mirrored contrast appears as a decrease from the AD side.
        let r = results.get(&acc, "Resilient_over_Dementia-AD").unwrap();
        assert_eq!(r.direction, Some(Direction::Decrease));
    }

    for p in 4..8 {
        let acc = format!("P{:02}", p);
        let r = results.get(&acc, "Dementia-AD_over_Normal").unwrap();
        assert!(
            r.significant,
            "{} should be significant, padj = {}",
            acc, r.p_adj
        );
        assert_eq!(r.direction, Some(Direction::Decrease));
        assert!((r.log_fc + 2.0).abs() < 0.6, "logFC = {}", r.log_fc);
    }
}

#[test]
fn test_null_proteins_have_small_effects() {
    let (matrix, annotations, metadata) = load_inputs();
    let results = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap();

    for p in 8..42 {
        let acc = format!("P{:02}", p);
        for name in results.contrast_names() {
            let r = results.get(&acc, name).unwrap();
            assert!(
                r.log_fc.abs() < 0.5,
                "{} {} logFC = {}",
                acc,
                name,
                r.log_fc
            );
        }
    }
}

#[test]
fn test_padj_dominates_p() {
    let (matrix, annotations, metadata) = load_inputs();
    let results = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap();

    for r in results.iter() {
        if !r.p_value.is_nan() {
            assert!(r.p_adj >= r.p_value - 1e-12);
            assert!(r.p_adj <= 1.0);
        }
    }
}

#[test]
fn test_pipeline_config_matches_run_standard() {
    let (matrix, annotations, metadata) = load_inputs();
    let direct = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap();

    // Round-trip the step list through YAML before running it.
    let config = Pipeline::new()
        .name("standard")
        .filter_missingness(3)
        .normalize_median()
        .normalize_quantile()
        .log2_transform()
        .impute_row_min()
        .model_contrasts()
        .correct_bh()
        .to_config(Some("reference workflow"));
    let yaml = config.to_yaml().unwrap();
    let parsed = PipelineConfig::from_yaml(&yaml).unwrap();

    let piped = Pipeline::from_config(&parsed)
        .run(&matrix, &annotations, &metadata)
        .unwrap();

    assert_eq!(direct.len(), piped.len());
    for (a, b) in direct.iter().zip(piped.iter()) {
        assert_eq!(a.accession, b.accession);
        assert_eq!(a.contrast, b.contrast);
        assert!(
            (a.log_fc - b.log_fc).abs() < 1e-12 || (a.log_fc.is_nan() && b.log_fc.is_nan())
        );
    }
}

#[test]
fn test_panel_filter_in_workflow() {
    let (matrix, annotations, metadata) = load_inputs();
    let panel = IdSet::from_ids("synaptic", ["GENE0", "GENE5", "GENE10", "GENE15"]);
    let results = run_standard(&matrix, &annotations, &metadata, 3, Some(&panel)).unwrap();

    assert_eq!(results.len(), 4 * 6);
    assert!(results.get("P00", "Dementia-AD_over_Normal").is_some());
    assert!(results.get("P01", "Dementia-AD_over_Normal").is_none());
}

#[test]
fn test_sample_mismatch_aborts() {
    let (matrix, annotations, _) = load_inputs();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sample_id\tdiagnosis\tsex\teducation\tage_death\tpmi").unwrap();
    // Only half the samples are described.
    for i in 0..8 {
        let dx = if i < 4 { "Normal" } else { "Dementia-AD" };
        writeln!(file, "S{:02}\t{}\tfemale\t10\t85\t400", i, dx).unwrap();
    }
    file.flush().unwrap();
    let metadata = SampleMetadata::from_tsv(file.path()).unwrap();

    let err = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("S08"),
        "message should name a missing sample: {}",
        msg
    );
}

#[test]
fn test_ranking_deterministic_across_runs() {
    let (matrix, annotations, metadata) = load_inputs();

    let mut mapping = IdMap::new();
    for p in 0..N_PROTEINS {
        mapping.insert(&format!("P{:02}", p), &format!("ENTREZ{}", p));
    }
    // One ambiguous accession mapping to two genes.
    mapping.insert("P00", "ENTREZ_ALT");

    let run = || {
        let results = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap();
        build_ranking(&results, "Dementia-AD_over_Normal", &mapping).unwrap()
    };
    let first = run();
    let second = run();

    let a: Vec<(String, f64)> = first.iter().cloned().collect();
    let b: Vec<(String, f64)> = second.iter().cloned().collect();
    assert_eq!(a, b);

    // Strong positive effects rank at the top, strong negative at the
    // bottom.
    let top_gene = &a[0].0;
    assert!(
        ["ENTREZ0", "ENTREZ1", "ENTREZ2", "ENTREZ3", "ENTREZ_ALT"]
            .contains(&top_gene.as_str()),
        "unexpected top gene {}",
        top_gene
    );
    let bottom_gene = &a.last().unwrap().0;
    assert!(
        ["ENTREZ4", "ENTREZ5", "ENTREZ6", "ENTREZ7"].contains(&bottom_gene.as_str()),
        "unexpected bottom gene {}",
        bottom_gene
    );
}

#[test]
fn test_de_table_tsv_output() {
    let (matrix, annotations, metadata) = load_inputs();
    let results = run_standard(&matrix, &annotations, &metadata, 3, None).unwrap();

    let out = NamedTempFile::new().unwrap();
    results.to_tsv(out.path()).unwrap();

    let contents = std::fs::read_to_string(out.path()).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "accession\tgene\tdescription\tcontrast\tlogFC\tp.value\tpadj\tsignificant\tdirection"
    );
    assert_eq!(lines.count(), results.len());
}
