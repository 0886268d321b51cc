use anyhow::Result;
use clap::{Parser, Subcommand};
use engine::{
    process_queries, remove_duplicates, DocumentStatus, ExecutionPolicy, RequestQueue, SearchIndex,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, EnvFilter};

use std::time::Instant;

#[derive(Parser)]
#[command(name = "harness")]
#[command(about = "Drive the in-memory search engine: demo walkthrough and workload timing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through the engine operations on a small corpus
    Demo,
    /// Generate a random workload and time sequential vs parallel execution
    Bench {
        /// Number of documents to index
        #[arg(long, default_value_t = 10_000)]
        documents: usize,
        /// Dictionary size the workload draws words from
        #[arg(long, default_value_t = 1_000)]
        dictionary: usize,
        /// Maximum generated word length
        #[arg(long, default_value_t = 10)]
        max_word_length: usize,
        /// Words per generated document
        #[arg(long, default_value_t = 70)]
        document_words: usize,
        /// Number of generated queries
        #[arg(long, default_value_t = 100)]
        queries: usize,
        /// Words per generated query
        #[arg(long, default_value_t = 70)]
        query_words: usize,
        /// Probability that a query word carries the exclusion marker
        #[arg(long, default_value_t = 0.1)]
        minus_probability: f64,
        /// RNG seed, for reproducible workloads
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Bench {
            documents,
            dictionary,
            max_word_length,
            document_words,
            queries,
            query_words,
            minus_probability,
            seed,
        } => run_bench(
            documents,
            dictionary,
            max_word_length,
            document_words,
            queries,
            query_words,
            minus_probability,
            seed,
        ),
    }
}

// ---------------------------------------------------------------------------
// demo
// ---------------------------------------------------------------------------

fn print_results(index: &SearchIndex, raw_query: &str) -> Result<()> {
    println!("results for query: {raw_query}");
    for document in index.find_top_documents(raw_query)? {
        println!("{}", serde_json::to_string(&document)?);
    }
    Ok(())
}

fn print_matches(index: &SearchIndex, raw_query: &str) -> Result<()> {
    println!("matching documents against query: {raw_query}");
    for document_id in index.document_ids().collect::<Vec<_>>() {
        let (words, status) = index.match_document(raw_query, document_id)?;
        let line = serde_json::json!({
            "document_id": document_id,
            "status": status,
            "words": words,
        });
        println!("{line}");
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    let mut index = SearchIndex::with_stop_words_text("and with")?;

    let corpus: [(i32, &str, DocumentStatus, &[i32]); 6] = [
        (1, "funny pet and nasty rat", DocumentStatus::Actual, &[7, 2, 7]),
        (2, "funny pet with curly hair", DocumentStatus::Actual, &[1, 2]),
        (3, "funny pet with curly hair", DocumentStatus::Actual, &[1, 2]),
        (4, "pet with rat and rat and rat", DocumentStatus::Actual, &[1]),
        (5, "nasty rat with curly hair", DocumentStatus::Banned, &[4, 4]),
        (6, "sharp hedgehog", DocumentStatus::Irrelevant, &[-2, -4]),
    ];
    for (id, text, status, ratings) in corpus {
        index.add_document(id, text, status, ratings)?;
        tracing::info!(document_id = id, ?status, text, "added");
    }

    print_results(&index, "curly nasty pet")?;
    print_results(&index, "curly nasty pet -rat")?;

    println!("banned documents for query: nasty rat");
    for document in index.find_top_documents_with(
        ExecutionPolicy::Sequential,
        "nasty rat",
        DocumentStatus::Banned,
    )? {
        println!("{}", serde_json::to_string(&document)?);
    }

    println!("even-id documents for query: pet");
    for document in index.find_top_documents_with(
        ExecutionPolicy::Sequential,
        "pet",
        |id: i32, _: DocumentStatus, _: i32| id % 2 == 0,
    )? {
        println!("{}", serde_json::to_string(&document)?);
    }

    print_matches(&index, "curly rat -sharp")?;

    let removed = remove_duplicates(&mut index);
    println!("removed {} duplicate document(s): {removed:?}", removed.len());
    println!("surviving documents:");
    for document_id in index.document_ids().collect::<Vec<_>>() {
        if let Some(text) = index.document_text(document_id) {
            println!("{document_id}: {text}");
        }
    }

    let mut queue = RequestQueue::new(&index);
    for raw_query in ["curly pet", "unknown word", "rat", "also unknown"] {
        queue.add_find_request(raw_query)?;
    }
    println!(
        "request queue saw {} empty result(s) in the last {} request(s)",
        queue.no_result_requests(),
        queue.recent_queries().count()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// bench
// ---------------------------------------------------------------------------

fn generate_word(rng: &mut StdRng, max_length: usize) -> String {
    let length = rng.gen_range(1..=max_length);
    (0..length).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

fn generate_dictionary(rng: &mut StdRng, word_count: usize, max_length: usize) -> Vec<String> {
    let mut words: Vec<String> = (0..word_count)
        .map(|_| generate_word(rng, max_length))
        .collect();
    words.sort();
    words.dedup();
    words
}

fn generate_query(
    rng: &mut StdRng,
    dictionary: &[String],
    word_count: usize,
    minus_probability: f64,
) -> String {
    let mut query = String::new();
    for _ in 0..word_count {
        if !query.is_empty() {
            query.push(' ');
        }
        if rng.gen_bool(minus_probability) {
            query.push('-');
        }
        query.push_str(&dictionary[rng.gen_range(0..dictionary.len())]);
    }
    query
}

#[allow(clippy::too_many_arguments)]
fn run_bench(
    documents: usize,
    dictionary_size: usize,
    max_word_length: usize,
    document_words: usize,
    queries: usize,
    query_words: usize,
    minus_probability: f64,
    seed: u64,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dictionary = generate_dictionary(&mut rng, dictionary_size, max_word_length);
    let texts: Vec<String> = (0..documents)
        .map(|_| generate_query(&mut rng, &dictionary, document_words, 0.0))
        .collect();
    let queries: Vec<String> = (0..queries)
        .map(|_| generate_query(&mut rng, &dictionary, query_words, minus_probability))
        .collect();

    let build = |texts: &[String]| -> Result<SearchIndex> {
        let mut index = SearchIndex::new();
        for (id, text) in texts.iter().enumerate() {
            index.add_document(id as i32, text, DocumentStatus::Actual, &[1, 2, 3])?;
        }
        Ok(index)
    };

    let start = Instant::now();
    let index = build(&texts)?;
    tracing::info!(
        documents = index.document_count(),
        dictionary = dictionary.len(),
        elapsed = ?start.elapsed(),
        "corpus indexed"
    );

    for (name, policy) in [
        ("sequential", ExecutionPolicy::Sequential),
        ("parallel", ExecutionPolicy::Parallel),
    ] {
        let start = Instant::now();
        let mut total_relevance = 0.0;
        for raw_query in &queries {
            for document in
                index.find_top_documents_with(policy, raw_query, DocumentStatus::Actual)?
            {
                total_relevance += document.relevance;
            }
        }
        println!(
            "find/{name}: {} queries in {:?} (total relevance {total_relevance:.6})",
            queries.len(),
            start.elapsed()
        );
    }

    let match_query = generate_query(&mut rng, &dictionary, 500, minus_probability);
    for (name, policy) in [
        ("sequential", ExecutionPolicy::Sequential),
        ("parallel", ExecutionPolicy::Parallel),
    ] {
        let start = Instant::now();
        let mut word_count = 0;
        for document_id in index.document_ids().collect::<Vec<_>>() {
            let (words, _status) = index.match_document_with(policy, &match_query, document_id)?;
            word_count += words.len();
        }
        println!(
            "match/{name}: {} documents in {:?} (matched {word_count} words)",
            index.document_count(),
            start.elapsed()
        );
    }

    let batch_start = Instant::now();
    let per_query = process_queries(&index, &queries)?;
    println!(
        "batch: {} queries in {:?} ({} result lists)",
        queries.len(),
        batch_start.elapsed(),
        per_query.len()
    );

    for (name, policy) in [
        ("sequential", ExecutionPolicy::Sequential),
        ("parallel", ExecutionPolicy::Parallel),
    ] {
        let mut index = build(&texts)?;
        let start = Instant::now();
        for id in 0..index.document_count() as i32 {
            index.remove_document_with(policy, id);
        }
        println!(
            "remove/{name}: emptied the index in {:?} ({} documents left)",
            start.elapsed(),
            index.document_count()
        );
    }

    Ok(())
}
