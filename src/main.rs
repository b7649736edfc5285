//! Tahrir REPL — drives a document session from stdin.
//!
//! Each input line is treated as one spoken utterance: it is classified
//! (oracles first, heuristic fallback) and applied to the in-memory
//! document, which is printed after every edit. Meta commands start with
//! a colon.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use tahrir::classify::ClassificationOrchestrator;
use tahrir::editor::{ControlEvent, DocumentSession};
use tahrir::oracle::{self, ProviderRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    tahrir::init_tracing();

    let cwd = std::env::current_dir().context("cannot resolve working directory")?;
    let config = oracle::load_or_default(&cwd);

    let registry = Arc::new(ProviderRegistry::new());
    let orchestrator = ClassificationOrchestrator::from_config(registry.clone(), &config);

    let available = registry.list_available().len();
    let total = registry.list_all().len();
    println!("tahrir — محرر نصوص صوتي ({available}/{total} مزود متاح، :help للمساعدة)");

    let session = DocumentSession::new(orchestrator, config.context_chars);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" | ":q" => break,
            ":help" => {
                println!(":show  عرض المستند   :history  سجل التعديلات   :clear  مسح   :providers  المزودون   :health  فحص الاتصال   :quit  خروج");
                continue;
            }
            ":show" => {
                println!("{}", session.text().await);
                continue;
            }
            ":history" => {
                for record in session.history().await {
                    println!(
                        "{}  [{}]  {}",
                        record.at.format("%H:%M:%S"),
                        record.provider.as_deref().unwrap_or("-"),
                        record.description
                    );
                }
                continue;
            }
            ":clear" => {
                session.clear().await;
                println!("تم مسح المستند");
                continue;
            }
            ":providers" => {
                for descriptor in registry.list_all() {
                    let state = if registry.credential(&descriptor.name).is_some() {
                        "متاح"
                    } else {
                        "بدون مفتاح"
                    };
                    println!(
                        "{:<12} {:<16} أولوية {}  {state}",
                        descriptor.name, descriptor.display_name, descriptor.priority
                    );
                }
                continue;
            }
            ":health" => {
                for available in registry.list_available() {
                    let name = &available.descriptor.name;
                    let reachable = session.orchestrator().health_check(name).await;
                    println!(
                        "{:<12} {}",
                        name,
                        if reachable { "متصل" } else { "غير متصل" }
                    );
                }
                continue;
            }
            _ => {}
        }

        match session.process(line).await {
            Ok(result) => {
                if let Some(note) = &result.outcome.note {
                    println!("ملاحظة: {note}");
                }
                match result.outcome.control {
                    Some(ControlEvent::StopListening) => println!("(إيقاف الاستماع)"),
                    Some(ControlEvent::StartListening) => println!("(بدء الاستماع)"),
                    Some(ControlEvent::ContinuousOn) => println!("(الوضع المستمر مفعل)"),
                    Some(ControlEvent::ContinuousOff) => println!("(الوضع المستمر معطل)"),
                    None => {}
                }
                if result.outcome.changed {
                    println!("--- المستند ---");
                    println!("{}", result.outcome.text);
                }
            }
            Err(e) => eprintln!("خطأ: {e}"),
        }
    }

    Ok(())
}
