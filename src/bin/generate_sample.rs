//! Writes a demo measurement database covering every chart kind, with
//! seeded noise so repeated runs produce identical data.

use std::f64::consts::PI;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusqlite::{params, Connection};

fn create_xy_table(conn: &Connection, name: &str, extra_column: &str) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE \"{name}\" (ValueX REAL, ValueY REAL, {extra_column} TEXT)"
    ))
    .with_context(|| format!("creating table {name}"))?;
    Ok(())
}

fn insert_rows(
    conn: &Connection,
    name: &str,
    rows: &[(f64, f64)],
    mut extra: impl FnMut(usize) -> String,
) -> Result<()> {
    let mut stmt = conn
        .prepare(&format!("INSERT INTO \"{name}\" VALUES (?1, ?2, ?3)"))
        .with_context(|| format!("preparing insert into {name}"))?;
    for (i, &(x, y)) in rows.iter().enumerate() {
        stmt.execute(params![x, y, extra(i)])
            .with_context(|| format!("inserting into {name}"))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let output_path = "demo_harmonic_data.db";
    let mut conn = Connection::open(output_path)
        .with_context(|| format!("creating database {output_path}"))?;
    let tx = conn.transaction().context("opening transaction")?;

    let mut table_count = 0;

    // Waveforms: one second of a fundamental plus a third harmonic.
    for i in 0..3u32 {
        let name = format!("Cable_RMU{}_Waveform_{}", i + 1, 13600 + i);
        let frequency = 50.0 + f64::from(i) * 10.0;
        let rows: Vec<(f64, f64)> = (0..2000)
            .map(|s| {
                let t = f64::from(s) / 2000.0;
                let y = (2.0 * PI * frequency * t).sin()
                    + 0.1 * (2.0 * PI * frequency * 3.0 * t).sin()
                    + rng.random_range(-0.05..0.05);
                (t, y)
            })
            .collect();
        create_xy_table(&tx, &name, "Quality")?;
        insert_rows(&tx, &name, &rows, |s| {
            if s % 7 == 0 { "Fair" } else { "Good" }.to_string()
        })?;
        table_count += 1;
    }

    // Hz spectra: harmonic peaks at multiples of 50 Hz.
    for i in 0..3u32 {
        let name = format!("Cable_RMU{}_Spectrum_Hz_{}", i + 1, 13600 + i);
        let magnitudes = [100.0, 45.0, 20.0, 15.0, 8.0, 5.0, 3.0, 2.0, 1.0, 0.5];
        let rows: Vec<(f64, f64)> = magnitudes
            .iter()
            .enumerate()
            .map(|(h, &m)| {
                let scaled = m * (1.0 + f64::from(i) * 0.1);
                let noisy = scaled + rng.random_range(-0.05..0.05) * scaled;
                (50.0 * (h + 1) as f64, noisy)
            })
            .collect();
        create_xy_table(&tx, &name, "Phase")?;
        insert_rows(&tx, &name, &rows, |_| {
            format!("{:.1}", rng.random_range(0.0..360.0))
        })?;
        table_count += 1;
    }

    // Order spectra: the usual 1/n harmonic decay over 20 orders.
    for i in 0..2u32 {
        let name = format!("Cable_RMU{}_Spectrum_Order_{}", i + 1, 13600 + i);
        let rows: Vec<(f64, f64)> = (1..=20)
            .map(|order| {
                let base = 100.0 / f64::from(order);
                let noisy = (base + rng.random_range(-0.1..0.1) * base).max(0.1);
                (f64::from(order), noisy)
            })
            .collect();
        create_xy_table(&tx, &name, "Status")?;
        insert_rows(&tx, &name, &rows, |s| {
            if s > 15 { "Warning" } else { "OK" }.to_string()
        })?;
        table_count += 1;
    }

    // Generic measurements: a day of temperatures.
    for i in 0..2u32 {
        let name = format!("Temperature_Sensor_{}_Data", i + 1);
        let rows: Vec<(f64, f64)> = (0..100)
            .map(|s| {
                let hours = f64::from(s) * 24.0 / 99.0;
                let temp =
                    20.0 + 10.0 * (2.0 * PI * hours / 24.0).sin() + rng.random_range(-2.0..2.0);
                (hours, temp)
            })
            .collect();
        create_xy_table(&tx, &name, "Location")?;
        insert_rows(&tx, &name, &rows, move |_| format!("Sensor_{}", i + 1))?;
        table_count += 1;
    }

    // System tables that the analyser omits.
    tx.execute_batch(
        "CREATE TABLE DeviceID_IID (DeviceID TEXT, SerialNumber TEXT);
         INSERT INTO DeviceID_IID VALUES ('DEV-001', 'SN-99812');
         CREATE TABLE SystemFrequency (Frequency REAL);
         INSERT INTO SystemFrequency VALUES (50.0);",
    )
    .context("creating system tables")?;
    table_count += 2;

    tx.commit().context("committing demo data")?;
    println!("Wrote {table_count} tables to {output_path}");
    Ok(())
}
