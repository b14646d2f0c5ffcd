#![allow(clippy::expect_used, clippy::doc_markdown, clippy::too_many_lines)]
//! Example: highlighting a simulated inbox
//!
//! Builds an in-memory inbox, runs the highlighter against it and prints the
//! report of every pass while the "host" adds rows, edits rules and
//! navigates to another view.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=rowtint_core=debug cargo run --package rowtint-core --example inbox_demo
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rowtint_core::rules::MemoryRuleStore;
use rowtint_core::{EngineConfig, Highlighter, Rule, RuleKind};
use rowtint_dom::{Document, ElementSpec, HostDom, NodeId, element};
use tokio::sync::oneshot;
use tokio::task::LocalSet;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

fn message(sender: &str, subject: &str, labels: &[&str]) -> ElementSpec {
    element("tr")
        .class("zA")
        .child(
            element("td")
                .class("yW")
                .child(element("span").attr("email", sender).text(sender)),
        )
        .child(element("td").child(element("span").class("bog").text(subject)))
        .child(element("td").children(
            labels
                .iter()
                .map(|label| element("div").class("ar").attr("data-label-name", label)),
        ))
}

fn grid(rows: Vec<ElementSpec>) -> ElementSpec {
    element("table")
        .attr("role", "grid")
        .child(element("tbody").children(rows))
}

fn print_rows(dom: &Document, tbody: NodeId) {
    for row in dom.children(tbody) {
        let rule = dom.attribute(row, "data-highlight-rule-id");
        let color = dom.attribute(row, "data-highlight-color");
        let sender = dom.attribute(row, "data-highlight-sender");
        println!(
            "  row {:>3}  sender={:<24} rule={:<10} color={}",
            row.index(),
            sender.unwrap_or_default(),
            rule.unwrap_or_else(|| "-".to_string()),
            color.unwrap_or_else(|| "-".to_string()),
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut doc = Document::new();
    let body = doc.body_id();
    let main_view = doc.append(body, element("div").attr("role", "main"))?;
    let table = doc.append(
        main_view,
        grid(vec![
            message("alice@acme.com", "Quarterly numbers", &["Work"]),
            message("news@letters.io", "This week in Rust", &[]),
            message("ceo@corp.com", "Board meeting", &["VIP"]),
        ]),
    )?;
    let tbody = doc.children(table)[0];
    let dom = Rc::new(RefCell::new(doc));

    let store = MemoryRuleStore::new(vec![
        Rule::new("work", RuleKind::SenderContains, "@acme.com", "#FFE0E0"),
        Rule::new("vip", RuleKind::LabelContains, "Urgent, VIP", ""),
    ]);

    let mut highlighter = Highlighter::new(EngineConfig::default(), store.clone());
    let mut reports = highlighter.subscribe_reports();
    let (stop, shutdown) = oneshot::channel();

    let local = LocalSet::new();
    local
        .run_until(async {
            tokio::task::spawn_local(async move {
                while let Some(report) = reports.recv().await {
                    println!("pass: {report:?}");
                }
            });
            let engine = tokio::task::spawn_local(highlighter.run(dom.clone(), shutdown));

            sleep(Duration::from_secs(1)).await;
            println!("after initial sweep:");
            print_rows(&dom.borrow(), tbody);

            dom.borrow_mut()
                .append(tbody, message("bob@acme.com", "Re: numbers", &[]))
                .expect("tbody is an element");
            sleep(Duration::from_millis(300)).await;
            println!("after a new message arrived:");
            print_rows(&dom.borrow(), tbody);

            store.update(|rules| {
                rules.push(Rule::new("rust", RuleKind::SubjectContains, "rust", "#DDEEFF"));
            });
            sleep(Duration::from_millis(300)).await;
            println!("after adding a subject rule:");
            print_rows(&dom.borrow(), tbody);

            let next_table = dom
                .borrow_mut()
                .replace(table, grid(vec![message("eve@acme.com", "Another folder", &[])]))
                .expect("table is attached");
            let next_tbody = dom.borrow().children(next_table)[0];
            sleep(Duration::from_secs(1)).await;
            println!("after navigating:");
            print_rows(&dom.borrow(), next_tbody);

            stop.send(()).expect("engine is running");
            engine.await.expect("engine task")?;
            Ok::<_, Box<dyn std::error::Error>>(())
        })
        .await
}
