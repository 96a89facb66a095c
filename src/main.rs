// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ROBÔ DE USUÁRIOS CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// CLI para busca, inativação e cadastro em lote.
//
// Uso:
//   robo-cli validar --lista nomes.txt
//   robo-cli buscar --base base.xlsx --lista nomes.txt --tui
//   robo-cli inativar --base base.xlsx --lista nomes.txt
//   robo-cli cadastro --login email --fluxo front novos.xlsx
//   robo-cli historico --filtro inativação
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use robo_usuarios::config::{load_app_config, parse_bool, AppConfig};
use robo_usuarios::extractor::IdentifierSet;
use robo_usuarios::history::{
    export_history_csv, export_history_json, CadastroPrefs, HistoryLog, JsonFileStore,
    KeyValueStore, MemoryStore, Preferences,
};
use robo_usuarios::prelude::*;
use robo_usuarios::table::ResultTable;
use robo_usuarios::tui::{create_event_channel, run_tui, TuiLogger};

#[derive(Parser)]
#[command(name = "robo-cli", version, about = "Robô de Usuários: busca, inativação e cadastro em lote")]
struct Cli {
    /// URL do backend (sobrepõe ROBO_API_BASE)
    #[arg(long, global = true)]
    api: Option<String>,

    #[command(subcommand)]
    comando: Comando,
}

#[derive(Subcommand)]
enum Comando {
    /// Valida a lista de identificadores sem consultar o backend
    Validar {
        /// Arquivo texto com um identificador por linha ("-" para stdin)
        #[arg(long)]
        lista: String,
    },

    /// Busca os candidatos na planilha base
    Buscar {
        #[arg(long)]
        base: PathBuf,
        /// Arquivo texto com um identificador por linha ("-" para stdin)
        #[arg(long)]
        lista: String,
        /// Filtra a tabela por nome ou CPF
        #[arg(long)]
        filtro: Option<String>,
        /// Página a exibir
        #[arg(long, default_value_t = 1)]
        pagina: usize,
        /// Exporta a visão filtrada para CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Abre a tabela na TUI
        #[arg(long)]
        tui: bool,
    },

    /// Gera a planilha de inativação (prévia + confirmação)
    Inativar {
        #[arg(long)]
        base: PathBuf,
        /// Planilha com a lista
        #[arg(long, conflicts_with = "lista")]
        lista_arquivo: Option<PathBuf>,
        /// Arquivo texto com a lista ("-" para stdin)
        #[arg(long)]
        lista: Option<String>,
        /// Habilita fuzzy matching (sim/não)
        #[arg(long, value_parser = parse_flag)]
        fuzzy: Option<bool>,
        /// Corte de similaridade (0.0 - 1.0)
        #[arg(long)]
        cutoff: Option<f64>,
        /// Caminho da planilha gerada
        #[arg(long)]
        saida: Option<PathBuf>,
        /// Confirma a prévia sem perguntar
        #[arg(long)]
        sim: bool,
        /// Exporta as correspondências já inativas para CSV
        #[arg(long)]
        exportar_inativos: Option<PathBuf>,
    },

    /// Gera a planilha de cadastro em lote
    Cadastro {
        /// Campo de login (cpf ou email)
        #[arg(long)]
        login: Option<LoginChoice>,
        /// Fluxo (self ou front)
        #[arg(long)]
        fluxo: Option<Fluxo>,
        /// Caminho da planilha gerada
        #[arg(long)]
        saida: Option<PathBuf>,
        /// Planilhas de entrada
        files: Vec<PathBuf>,
    },

    /// Mostra, exporta ou limpa o histórico de ações
    Historico {
        #[arg(long)]
        filtro: Option<String>,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        limpar: bool,
    },

    /// Verifica se o backend está no ar
    Health,
}

fn parse_flag(value: &str) -> Result<bool, String> {
    parse_bool(value).ok_or_else(|| format!("valor inválido: {} (use sim ou não)", value))
}

/// Tenta carregar o arquivo .env do diretório atual ou do pai
fn load_dotenv() {
    for path in [PathBuf::from(".env"), PathBuf::from("../.env")] {
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => {
                    eprintln!("✓ Carregado .env de: {:?}", path);
                    return;
                }
                Err(e) => eprintln!("⚠ Erro ao carregar {:?}: {}", path, e),
            }
        }
    }
}

/// Dependências compartilhadas pelos subcomandos
struct Contexto {
    config: AppConfig,
    client: Arc<dyn BackendClient>,
    guard: Arc<ActionGuard>,
    history: Arc<HistoryLog>,
    prefs: Preferences,
}

impl Contexto {
    fn new(api: Option<String>) -> anyhow::Result<Self> {
        let mut config = load_app_config();
        if let Some(api) = api {
            config.api_base = api.trim_end_matches('/').to_string();
        }

        let client = HttpBackendClient::new(&config.api_base)?
            .with_health_timeout(config.health_timeout);

        let store: Arc<dyn KeyValueStore> = match JsonFileStore::open(&config.data_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!(
                    "⚠️  Armazenamento indisponível em {} ({}); histórico só em memória",
                    config.data_dir.display(),
                    e
                );
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self {
            config,
            client: Arc::new(client),
            guard: Arc::new(ActionGuard::new()),
            history: Arc::new(HistoryLog::new(store.clone())),
            prefs: Preferences::new(store),
        })
    }
}

#[tokio::main]
async fn main() {
    load_dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        // Erros de fluxo já foram notificados pela interface
        if e.downcast_ref::<WorkflowError>().is_none() {
            eprintln!("Erro: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Comando::Validar { lista } = &cli.comando {
        return cmd_validar(lista).await;
    }

    let ctx = Contexto::new(cli.api)?;
    match cli.comando {
        // tratado acima, sem backend
        Comando::Validar { .. } => Ok(()),
        Comando::Buscar {
            base,
            lista,
            filtro,
            pagina,
            csv,
            tui,
        } => {
            let ids = extract_identifiers(&read_lista(&lista).await?);
            print_extraction(&ids);
            let base = read_upload(&base).await?;
            if tui {
                cmd_buscar_tui(&ctx, base, ids, filtro).await
            } else {
                cmd_buscar(&ctx, base, ids, filtro, pagina, csv).await
            }
        }
        Comando::Inativar {
            base,
            lista_arquivo,
            lista,
            fuzzy,
            cutoff,
            saida,
            sim,
            exportar_inativos,
        } => {
            let lista_file = match lista_arquivo {
                Some(path) => Some(read_upload(&path).await?),
                None => None,
            };
            let lista_text = match lista {
                Some(lista) => read_lista(&lista).await?,
                None => String::new(),
            };

            let mut params = ctx.prefs.fuzzy(ctx.config.fuzzy);
            if let Some(flag) = fuzzy {
                params.use_fuzzy = flag;
            }
            if let Some(cutoff) = cutoff {
                anyhow::ensure!(
                    (0.0..=1.0).contains(&cutoff),
                    "--cutoff deve estar entre 0 e 1"
                );
                params.cutoff = cutoff;
            }
            if let Err(e) = ctx.prefs.save_fuzzy(params) {
                log::warn!("⚠️  Falha ao gravar preferências de fuzzy: {}", e);
            }

            let input = InactivationInput {
                base: Some(read_upload(&base).await?),
                lista_file,
                lista_text,
                prefetched: Vec::new(),
                fuzzy: params,
            };
            let mut ui = ConsoleUi::new(sim);
            if let Some(path) = exportar_inativos {
                ui = ui.with_inactive_export(path);
            }
            cmd_inativar(&ctx, &input, &ui, saida).await
        }
        Comando::Cadastro {
            login,
            fluxo,
            saida,
            files,
        } => {
            let stored = ctx.prefs.cadastro();
            let prefs = CadastroPrefs {
                login_choice: login.unwrap_or(stored.login_choice),
                fluxo: fluxo.unwrap_or(stored.fluxo),
            };
            if let Err(e) = ctx.prefs.save_cadastro(prefs) {
                log::warn!("⚠️  Falha ao gravar preferências de cadastro: {}", e);
            }

            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(read_upload(path).await?);
            }
            let request = CadastroRequest {
                files: uploads,
                login_choice: prefs.login_choice,
                fluxo: prefs.fluxo,
            };
            cmd_cadastro(&ctx, &request, saida).await
        }
        Comando::Historico {
            filtro,
            csv,
            json,
            limpar,
        } => cmd_historico(&ctx, filtro, csv, json, limpar).await,
        Comando::Health => cmd_health(&ctx).await,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ENTRADA E SAÍDA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Lê a lista de um arquivo texto, ou do stdin quando `-`
async fn read_lista(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Falha ao ler a lista do stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Falha ao ler a lista {}", source))
}

async fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    UploadFile::read(path)
        .await
        .with_context(|| format!("Falha ao ler {}", path.display()))
}

/// Grava a planilha em `saida` ou em `ROBO_OUTPUT_DIR/<nome sugerido>`
async fn save_generated(
    config: &AppConfig,
    saida: Option<PathBuf>,
    file: &GeneratedFile,
) -> anyhow::Result<PathBuf> {
    let path = saida.unwrap_or_else(|| config.output_dir.join(&file.filename));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("Falha ao gravar {}", path.display()))?;
    Ok(path)
}

async fn write_text(path: &Path, content: &str) -> anyhow::Result<()> {
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Falha ao gravar {}", path.display()))
}

fn print_extraction(ids: &IdentifierSet) {
    println!("📋 {}", ids.summary());
    if let Some(warning) = ids.duplicates_warning() {
        eprintln!("⚠️  {}", warning);
    }
}

fn print_page(table: &ResultTable) {
    println!(
        "{:<32} {:<15} {:<32} {:<10} {}",
        "Nome", "CPF", "E-mail", "Status", "Situação"
    );
    for row in table.page_rows() {
        println!(
            "{:<32} {:<15} {:<32} {:<10} {}",
            row.nome,
            row.cpf,
            row.email,
            row.status_atual,
            row.status.label()
        );
    }
    if table.filtered_count() == 0 {
        println!("(nenhum registro)");
    }
    println!(
        "{} · {} de {} registro(s)",
        table.page_info(),
        table.filtered_count(),
        table.total_count()
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SUBCOMANDOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn cmd_validar(lista: &str) -> anyhow::Result<()> {
    let ids = extract_identifiers(&read_lista(lista).await?);

    println!("Linhas lidas: {}", ids.total_lines);
    println!("  CPFs:    {}", ids.cpfs.len());
    println!("  Nomes:   {}", ids.names.len());
    println!("  E-mails: {}", ids.emails.len());
    print_extraction(&ids);

    if !ids.discarded.is_empty() {
        println!("Linhas descartadas:");
        for line in &ids.discarded {
            println!("  - {}", line);
        }
    }
    if ids.is_empty() {
        let e = WorkflowError::NoIdentifiers;
        eprintln!("❌ Erro: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn cmd_buscar(
    ctx: &Contexto,
    base: UploadFile,
    ids: IdentifierSet,
    filtro: Option<String>,
    pagina: usize,
    csv: Option<PathBuf>,
) -> anyhow::Result<()> {
    let ui = ConsoleUi::new(false);
    let mut busca = SearchOrchestrator::new(ctx.client.clone());
    busca.search(Some(&base), &ids, &ui).await?;

    let table = busca.table_mut();
    if let Some(filtro) = filtro {
        table.set_search_term(&filtro);
    }
    table.go_to_page(pagina);
    print_page(table);

    if let Some(path) = csv {
        match table.export_csv() {
            Some(content) => {
                write_text(&path, &content).await?;
                println!("📄 CSV salvo em {}", path.display());
            }
            None => println!("📄 Nada para exportar"),
        }
    }
    Ok(())
}

async fn cmd_buscar_tui(
    ctx: &Contexto,
    base: UploadFile,
    ids: IdentifierSet,
    filtro: Option<String>,
) -> anyhow::Result<()> {
    let (tx, rx) = create_event_channel();
    let logger = TuiLogger::new(tx);
    let title = base.name.clone();
    let client = ctx.client.clone();

    // Logs no terminal quebrariam a tela da TUI
    let previous_level = log::max_level();
    log::set_max_level(log::LevelFilter::Off);

    let search_handle = tokio::spawn(async move {
        let mut busca = SearchOrchestrator::new(client);
        logger.info(ids.summary());
        if busca.search(Some(&base), &ids, &logger).await.is_ok() {
            logger.records(busca.into_table().records().to_vec());
        }
    });

    let mut table = ResultTable::new();
    if let Some(filtro) = filtro {
        table.set_search_term(&filtro);
    }

    // Executar TUI (bloqueia até o usuário sair)
    let result = run_tui(title, table, rx);
    log::set_max_level(previous_level);
    search_handle.abort();

    let app = result?;
    println!(
        "{} · {} de {} registro(s)",
        app.table.page_info(),
        app.table.filtered_count(),
        app.table.total_count()
    );
    Ok(())
}

async fn cmd_inativar(
    ctx: &Contexto,
    input: &InactivationInput,
    ui: &ConsoleUi,
    saida: Option<PathBuf>,
) -> anyhow::Result<()> {
    let gate = CommitGate::new(ctx.client.clone(), ctx.guard.clone())
        .with_history(ctx.history.clone());

    match gate.run(input, ui).await? {
        GateOutcome::Generated(file) => {
            let path = save_generated(&ctx.config, saida, &file).await?;
            println!("💾 Planilha salva em {}", path.display());
        }
        GateOutcome::Cancelled => println!("🚫 Inativação cancelada"),
        GateOutcome::Ignored => println!("⏸️  Inativação já em andamento"),
    }
    Ok(())
}

async fn cmd_cadastro(
    ctx: &Contexto,
    request: &CadastroRequest,
    saida: Option<PathBuf>,
) -> anyhow::Result<()> {
    let flow = CadastroFlow::new(ctx.client.clone(), ctx.guard.clone())
        .with_history(ctx.history.clone());

    match flow.run(request, &ConsoleUi::new(false)).await? {
        Some(file) => {
            let path = save_generated(&ctx.config, saida, &file).await?;
            println!("💾 Planilha salva em {}", path.display());
        }
        None => println!("⏸️  Cadastro já em andamento"),
    }
    Ok(())
}

async fn cmd_historico(
    ctx: &Contexto,
    filtro: Option<String>,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
    limpar: bool,
) -> anyhow::Result<()> {
    if limpar {
        ctx.history.clear()?;
        println!("🧹 Histórico limpo");
        return Ok(());
    }

    let entries = match filtro {
        Some(term) => ctx.history.filter(&term),
        None => ctx.history.entries(),
    };
    for entry in entries.iter().rev() {
        println!("{}  {}", entry.formatted_ts(), entry.text);
    }
    println!("{}", ctx.history.summary(&entries));

    if let Some(path) = csv {
        match export_history_csv(&entries) {
            Some(content) => {
                write_text(&path, &content).await?;
                println!("📄 CSV salvo em {}", path.display());
            }
            None => println!("📄 Histórico vazio, nada para exportar"),
        }
    }
    if let Some(path) = json {
        match export_history_json(&entries)? {
            Some(content) => {
                write_text(&path, &content).await?;
                println!("📄 JSON salvo em {}", path.display());
            }
            None => println!("📄 Histórico vazio, nada para exportar"),
        }
    }
    Ok(())
}

async fn cmd_health(ctx: &Contexto) -> anyhow::Result<()> {
    if ctx.client.health().await {
        println!("🟢 API online ({})", ctx.config.api_base);
        Ok(())
    } else {
        anyhow::bail!("API offline ({})", ctx.config.api_base)
    }
}
