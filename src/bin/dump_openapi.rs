use std::fs;

fn main() -> anyhow::Result<()> {
    let doc = badge_gate::docs::build_openapi(8000)?;
    let s = serde_json::to_string_pretty(&doc)?;

    match std::env::args().nth(1) {
        Some(path) => {
            fs::write(&path, s)?;
            println!("wrote {}", path);
        }
        None => println!("{}", s),
    }
    Ok(())
}
