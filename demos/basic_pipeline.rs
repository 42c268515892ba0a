//! Basic example pairing expression with drug response.
//!
//! This example shows how to:
//! 1. Build a small multi-assay source
//! 2. Gather genetic and response data into one tall table
//! 3. Convert CCLE sample names to cell line names
//! 4. Pair responses against genetic features

use tidy_assay::prelude::*;

fn main() -> Result<()> {
    println!("=== Tidy Assay Example ===\n");

    let source = create_example_source()?;
    println!("Data types: {}", source.data_types().join(", "));
    println!();

    // Gather everything under gene symbols and drug names
    println!("=== Gathering ===\n");

    let request = GatherRequest::new()
        .data_types(
            Selector::only(["rna", "mutation"]),
            vec!["Symbol".to_string(), "feature_id".to_string()],
        )
        .responses(Selector::All)
        .resp_col("drug_name");
    let tall = gather_combined(&source, &request)?;
    println!("{}", TableSummary::of(&tall)?);
    println!();

    // Harmonize sample ids against the bundled crosswalk
    println!("=== Converting Sample Ids ===\n");

    let ccle = filter_id_type(cell_line_ids()?, "ccle")?;
    let converted = convert_ids(&tall, &ccle, "id", "cell_line", &["tissue"])?;
    println!(
        "Samples: {}",
        converted.distinct_keys("sample_id")?.join(", ")
    );
    println!();

    // Pair every response with BRAF across genetic types
    println!("=== Response vs Genetic ===\n");

    let responses = converted.filter(|r| r[2].as_text() == Some("ic50"));
    let genetics = converted.filter(|r| r[2].as_text() != Some("ic50"));
    let rvg = make_response_vs_genetic(
        &responses,
        &genetics,
        &PairFilter::all(),
        &PairFilter::ids(Selector::only(["BRAF"])),
    )?;

    println!(
        "{:<10} {:<20} {:>10} {:<15} {:>10}",
        "Sample", "Response", "Value", "Feature", "Value"
    );
    println!("{}", "-".repeat(69));
    for i in 0..rvg.n_rows() {
        println!(
            "{:<10} {:<20} {:>10} {:<15} {:>10}",
            cell(&rvg, i, "sample_id"),
            cell(&rvg, i, "resp_name"),
            cell(&rvg, i, "resp_value"),
            cell(&rvg, i, "feature_name"),
            cell(&rvg, i, "feature_value"),
        );
    }
    println!();

    // The same workflow as a reusable pipeline
    println!("=== Pipeline ===\n");

    let genetic_request = GatherRequest::new().data_types(
        Selector::only(["rna", "mutation"]),
        vec!["Symbol".to_string(), "feature_id".to_string()],
    );
    let pipeline = Pipeline::new()
        .name("braf-vs-genetics")
        .convert_ids_of_type("ccle", "id", "cell_line", &[])
        .pair_genetic(
            PairFilter::ids(Selector::only(["BRAF"])).data_types(Selector::only(["rna"])),
            PairFilter::all(),
        )
        .drop_self_pairs();
    let gvg = pipeline.run(&source, &genetic_request)?;
    println!("Pairs: {}", gvg.n_rows());
    println!();
    println!("Configuration:\n{}", pipeline.to_config(None).to_yaml()?);

    Ok(())
}

fn cell(table: &Table, row: usize, column: &str) -> String {
    table
        .get(row, column)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Two cell lines under CCLE names with expression, mutation calls and IC50s.
fn create_example_source() -> Result<MultiAssaySource> {
    let samples = vec!["A375_SKIN".to_string(), "MCF7_BREAST".to_string()];

    let rna = AssayMatrix::from_rows(
        vec![vec![8.2, 5.1], vec![4.4, 6.9], vec![7.5, 7.0]],
        vec![
            "ENSG00000157764".into(),
            "ENSG00000146648".into(),
            "ENSG00000141510".into(),
        ],
        samples.clone(),
    )?;
    let genes = Annotation::new(
        "gene_id",
        vec![
            "ENSG00000157764".into(),
            "ENSG00000146648".into(),
            "ENSG00000141510".into(),
        ],
    )
    .with_alias("Symbol", ["BRAF", "EGFR", "TP53"])?;

    let mutation = AssayMatrix::from_rows(
        vec![vec![1.0, 0.0], vec![0.0, 0.0]],
        vec!["BRAF".into(), "TP53".into()],
        samples.clone(),
    )?
    .with_raw(vec![
        vec!["V600E".into(), "wt".into()],
        vec!["wt".into(), "wt".into()],
    ])?;

    let ic50 = AssayMatrix::from_rows(
        vec![vec![0.05, 12.0], vec![3.0, 0.8]],
        vec!["D1".into(), "D2".into()],
        samples,
    )?;
    let drugs = Annotation::new("drug_id", vec!["D1".into(), "D2".into()])
        .with_alias("drug_name", ["vemurafenib", "tamoxifen"])?;

    MultiAssaySource::new()
        .with_experiment(Experiment::new("rna", rna).with_features(genes))?
        .with_experiment(Experiment::new("mutation", mutation))?
        .with_response(Experiment::new("ic50", ic50).with_features(drugs))
}
