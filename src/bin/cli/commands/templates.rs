use anyhow::{bail, Context, Result};

use cardsmith::flashcards::StoredTemplate;

use crate::app::App;
use crate::OutputFormat;

fn print_template(template: &StoredTemplate) {
    println!("{} ({})", template.spec.template_name, template.id());
    println!("  front: {}", template.spec.front.join(", "));
    println!("  back:  {}", template.spec.back.join(", "));
}

pub fn run_create(app: &App, name: String, front: Vec<String>, back: Vec<String>, format: &OutputFormat) -> Result<()> {
    let template = app
        .templates()
        .create(name, front, back)
        .context("Failed to create template")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&template)?),
        OutputFormat::Plain => {
            println!("Created template:");
            print_template(&template);
        }
    }

    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let mut templates = app.templates().list().context("Failed to list templates")?;
    templates.sort_by(|a, b| a.spec.template_name.cmp(&b.spec.template_name));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&templates)?),
        OutputFormat::Plain => {
            if templates.is_empty() {
                println!("No templates found.");
                return Ok(());
            }
            for template in &templates {
                print_template(template);
            }
        }
    }

    Ok(())
}

pub fn run_show(app: &App, id: i64, format: &OutputFormat) -> Result<()> {
    let template = app
        .templates()
        .get(id)
        .context(format!("Template {} not found", id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&template)?),
        OutputFormat::Plain => print_template(&template),
    }

    Ok(())
}

pub fn run_delete(app: &App, id: i64, format: &OutputFormat) -> Result<()> {
    if !app.templates().delete(id).context("Failed to delete template")? {
        bail!("Template {} not found", id);
    }

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deleted": id });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Template {} deleted.", id),
    }

    Ok(())
}
