//! Loading, exploration and rule battery benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fiscalscope::tools::ToolRegistry;
use fiscalscope::{FiscalScope, Parser};
use std::io::Write;
use tempfile::NamedTempFile;

/// Generate an NF-e item export with a few planted inconsistencies.
fn generate_items(rows: usize) -> String {
    let mut data = String::new();
    data.push_str("Chave de Acesso;Número;Data Emissão;Razão Social Emitente;CPF/CNPJ Emitente;Nome Destinatário;Destino da Operação;CFOP;Código NCM/SH;Quantidade;Valor Unitário;Valor Total;Valor Nota Fiscal;Alíquota ICMS;Base Cálculo ICMS;Valor ICMS\n");

    let issuers = [
        ("ACME LTDA", "11222333000181"),
        ("BETA SA", "45723174000110"),
        ("GAMA ME", "11444777000161"),
    ];
    let recipients = ["LOJA CENTRO", "MERCADO SUL", "ATACADO NORTE", "PADARIA"];
    let items_per_note = 4;

    for row in 0..rows {
        let note = row / items_per_note;
        let (issuer, cnpj) = issuers[note % issuers.len()];
        let destination = if note % 5 == 0 { "2 - Interestadual" } else { "1 - Operação interna" };
        let cfop = match (note % 5 == 0, row % 97 == 0) {
            (true, false) => "6102",
            (true, true) => "5102",
            (false, false) => "5102",
            (false, true) => "6108",
        };
        let ncm = if row % 53 == 0 { "8471" } else { "84713012" };
        let quantity = 1 + row % 7;
        let unit = 10.0 + (row % 13) as f64;
        let total = quantity as f64 * unit;
        let note_total = (0..items_per_note)
            .map(|i| {
                let r = note * items_per_note + i;
                (1 + r % 7) as f64 * (10.0 + (r % 13) as f64)
            })
            .sum::<f64>();
        let icms = total * 0.18;

        data.push_str(&format!(
            "NFE{:044};{};2024-{:02}-{:02};{};{};{};{};{};{};{};{:.2};{:.2};{:.2};18;{:.2};{:.2}\n",
            note,
            note + 1,
            (note % 12) + 1,
            (note % 28) + 1,
            issuer,
            cnpj,
            recipients[note % recipients.len()],
            destination,
            cfop,
            ncm,
            quantity,
            unit,
            total,
            note_total,
            total,
            icms
        ));
    }

    data
}

fn temp_csv(data: &str) -> NamedTempFile {
    let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
    temp.write_all(data.as_bytes()).unwrap();
    temp
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_items(*rows);
        let temp = temp_csv(&data);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("item_rows", rows), temp.path(), |b, path| {
            b.iter(|| black_box(Parser::new().parse_file(path).unwrap()))
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let scope = FiscalScope::new();

    for rows in [100, 1_000, 10_000].iter() {
        let temp = temp_csv(&generate_items(*rows));
        let (dataset, _) = scope.load(temp.path()).unwrap();

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("item_rows", rows), &dataset, |b, dataset| {
            b.iter(|| black_box(scope.validate(dataset).unwrap()))
        });
    }

    group.finish();
}

fn bench_explore(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore");
    group.sample_size(20);
    let scope = FiscalScope::new();

    for rows in [100, 1_000].iter() {
        let temp = temp_csv(&generate_items(*rows));
        let (dataset, _) = scope.load(temp.path()).unwrap();

        group.bench_with_input(BenchmarkId::new("item_rows", rows), &dataset, |b, dataset| {
            b.iter(|| black_box(scope.explore(dataset)))
        });
    }

    group.finish();
}

/// Cached tool calls should cost rendering only.
fn bench_tools(c: &mut Criterion) {
    let mut group = c.benchmark_group("tools");

    let scope = FiscalScope::new();
    let temp = temp_csv(&generate_items(1_000));
    let (dataset, _) = scope.load(temp.path()).unwrap();
    let registry = ToolRegistry::new();
    let mut session = scope.session(dataset);
    registry.invoke(&mut session, "listar_inconsistencias", "");

    for name in ["resumo_riscos", "maiores_agressores", "relatorio_auditoria"] {
        group.bench_function(name, |b| b.iter(|| black_box(registry.invoke(&mut session, name, ""))));
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_validate, bench_explore, bench_tools);
criterion_main!(benches);
