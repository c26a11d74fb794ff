//! Summary command - fiscal KPIs of an NF-e item table.

use std::path::PathBuf;

use colored::Colorize;
use fiscalscope::report::format_brl;
use fiscalscope::summary::GroupTotal;
use fiscalscope::FiscalScope;

use super::{load, CommandResult};

fn print_groups(title: &str, groups: &[GroupTotal]) {
    if groups.is_empty() {
        return;
    }
    println!();
    println!("{}", title.yellow().bold());
    for group in groups {
        println!("  {:40} {:>20}", group.value, format_brl(group.total));
    }
}

pub fn run(scope: &FiscalScope, file: PathBuf, json: bool) -> CommandResult {
    let dataset = load(scope, &file, json)?;
    let overview = scope.fiscal_overview(&dataset)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    println!("Notas:          {}", overview.total_notas.to_string().white().bold());
    println!("Itens:          {}", overview.total_itens.to_string().white().bold());
    println!("Emitentes:      {}", overview.total_emitentes);
    println!("Destinatários:  {}", overview.total_destinatarios);
    println!("Valor itens:    {}", format_brl(overview.valor_total_itens));
    println!("Valor notas:    {}", format_brl(overview.valor_total_notas).green().bold());
    println!("Valor médio:    {}", format_brl(overview.valor_medio_nota));

    if !overview.timeline.is_empty() {
        println!();
        println!("{}", "Por competência:".yellow().bold());
        for month in &overview.timeline {
            println!("  {:10} {:>20}", month.competencia, format_brl(month.valor));
        }
    }

    print_groups("Top CFOP:", &overview.top_cfop);
    print_groups("Top NCM:", &overview.top_ncm);
    print_groups("Top emitentes:", &overview.top_emitentes);
    print_groups("Top destinatários:", &overview.top_destinatarios);

    Ok(())
}
