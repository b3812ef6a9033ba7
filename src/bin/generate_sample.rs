use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const ROWS: usize = 600;

const EXPERIENCE: [(&str, f64); 4] = [("EN", 0.6), ("MI", 0.85), ("SE", 1.15), ("EX", 1.6)];
const EMPLOYMENT: [&str; 4] = ["FT", "FT", "FT", "PT"];
const CONTRACT: [&str; 2] = ["CT", "FL"];
const REMOTE: [i64; 3] = [0, 50, 100];
const SIZES: [(&str, f64); 3] = [("S", 0.85), ("M", 1.0), ("L", 1.1)];
const TITLES: [(&str, f64); 12] = [
    ("Data Scientist", 1.0),
    ("Data Engineer", 1.0),
    ("Data Analyst", 0.75),
    ("Machine Learning Engineer", 1.1),
    ("Analytics Engineer", 0.95),
    ("Data Architect", 1.2),
    ("Research Scientist", 1.15),
    ("Applied Scientist", 1.2),
    ("Data Science Manager", 1.3),
    ("ML Engineer", 1.05),
    ("Head of Data", 1.4),
    ("BI Developer", 0.8),
];
/// Country code, currency, exchange rate to USD, salary level.
const COUNTRIES: [(&str, &str, f64, f64); 8] = [
    ("US", "USD", 1.0, 1.35),
    ("US", "USD", 1.0, 1.35),
    ("US", "USD", 1.0, 1.35),
    ("GB", "GBP", 1.25, 0.95),
    ("FR", "EUR", 1.08, 0.7),
    ("DE", "EUR", 1.08, 0.8),
    ("ES", "EUR", 1.08, 0.6),
    ("IN", "INR", 0.012, 0.3),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One row of the salary survey, in file column order.
#[derive(Debug, Serialize)]
struct Record {
    work_year: i64,
    experience_level: &'static str,
    employment_type: &'static str,
    job_title: &'static str,
    salary: i64,
    salary_currency: &'static str,
    salary_in_usd: i64,
    employee_residence: &'static str,
    remote_ratio: i64,
    company_location: &'static str,
    company_size: &'static str,
}

fn generate(rng: &mut SimpleRng) -> Vec<Record> {
    (0..ROWS)
        .map(|_| {
            let work_year = 2020 + (rng.next_u64() % 4) as i64;
            let &(experience_level, experience) = rng.pick(&EXPERIENCE);
            let employment_type = if rng.next_f64() < 0.05 {
                *rng.pick(&CONTRACT)
            } else {
                *rng.pick(&EMPLOYMENT)
            };
            let &(job_title, title) = rng.pick(&TITLES);
            let &(residence, currency, rate, level) = rng.pick(&COUNTRIES);
            let company_location = if rng.next_f64() < 0.9 { residence } else { "US" };
            let &(company_size, size) = rng.pick(&SIZES);
            let remote_ratio = *rng.pick(&REMOTE);

            // Salaries drift upwards over the years.
            let trend = 1.0 + 0.06 * (work_year - 2020) as f64;
            let usd = (110_000.0 * experience * title * size * level * trend
                + rng.gauss(0.0, 12_000.0))
            .max(5_000.0);

            Record {
                work_year,
                experience_level,
                employment_type,
                job_title,
                salary: (usd / rate).round() as i64,
                salary_currency: currency,
                salary_in_usd: usd.round() as i64,
                employee_residence: residence,
                remote_ratio,
                company_location,
                company_size,
            }
        })
        .collect()
}

fn write_csv(records: &[Record], path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(records: &[Record], path: &Path) -> anyhow::Result<()> {
    let int = |f: fn(&Record) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(records.iter().map(f).collect::<Vec<_>>()))
    };
    let text = |f: fn(&Record) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(records.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("work_year", DataType::Int64, false),
        Field::new("experience_level", DataType::Utf8, false),
        Field::new("employment_type", DataType::Utf8, false),
        Field::new("job_title", DataType::Utf8, false),
        Field::new("salary", DataType::Int64, false),
        Field::new("salary_currency", DataType::Utf8, false),
        Field::new("salary_in_usd", DataType::Int64, false),
        Field::new("employee_residence", DataType::Utf8, false),
        Field::new("remote_ratio", DataType::Int64, false),
        Field::new("company_location", DataType::Utf8, false),
        Field::new("company_size", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            int(|r| r.work_year),
            text(|r| r.experience_level),
            text(|r| r.employment_type),
            text(|r| r.job_title),
            int(|r| r.salary),
            text(|r| r.salary_currency),
            int(|r| r.salary_in_usd),
            text(|r| r.employee_residence),
            int(|r| r.remote_ratio),
            text(|r| r.company_location),
            text(|r| r.company_size),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let parquet = std::env::args().skip(1).any(|arg| arg == "--parquet");
    let mut rng = SimpleRng::new(42);
    let records = generate(&mut rng);

    let output_path = if parquet {
        Path::new("ds_salaries.parquet")
    } else {
        Path::new("ds_salaries.csv")
    };
    if parquet {
        write_parquet(&records, output_path)?;
    } else {
        write_csv(&records, output_path)?;
    }

    println!("Wrote {} salary records to {}", records.len(), output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use super::*;

    const COLUMNS: [&str; 11] = [
        "work_year",
        "experience_level",
        "employment_type",
        "job_title",
        "salary",
        "salary_currency",
        "salary_in_usd",
        "employee_residence",
        "remote_ratio",
        "company_location",
        "company_size",
    ];

    #[test]
    fn generation_is_deterministic_and_uses_known_codes() {
        let a = generate(&mut SimpleRng::new(42));
        let b = generate(&mut SimpleRng::new(42));
        assert_eq!(a.len(), ROWS);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.salary_in_usd, y.salary_in_usd);
            assert_eq!(x.job_title, y.job_title);
        }
        for r in &a {
            assert!((2020..=2023).contains(&r.work_year));
            assert!(EXPERIENCE.iter().any(|(code, _)| *code == r.experience_level));
            assert!(REMOTE.contains(&r.remote_ratio));
            assert!(r.salary_in_usd >= 5_000);
        }
        assert!(a.iter().any(|r| r.employee_residence == "FR"));
    }

    #[test]
    fn csv_output_has_the_survey_schema() {
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("ds_salaries.csv");
        let records = generate(&mut SimpleRng::new(7));
        write_csv(&records, &path).expect("write");

        let mut reader = csv::Reader::from_path(&path).expect("open");
        let headers: Vec<String> = reader
            .headers()
            .expect("headers")
            .iter()
            .map(str::to_string)
            .collect();
        assert_eq!(headers, COLUMNS);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
        assert_eq!(rows.len(), ROWS);
        assert_eq!(rows[0].get(6), Some(records[0].salary_in_usd.to_string().as_str()));
    }

    #[test]
    fn parquet_output_has_the_survey_schema() {
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("ds_salaries.parquet");
        let records = generate(&mut SimpleRng::new(7));
        write_parquet(&records, &path).expect("write");

        let file = std::fs::File::open(&path).expect("open");
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).expect("reader");
        let names: Vec<String> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, COLUMNS);
        let rows: usize = builder
            .build()
            .expect("build")
            .map(|batch| batch.expect("batch").num_rows())
            .sum();
        assert_eq!(rows, ROWS);
    }
}
