use plugin_loader::PluginLibrary;

fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let path = args.next().expect("usage: load_plugin <module> [symbol]");
    let symbol = args.next().unwrap_or_else(|| "compute".to_string());

    let mut plugin = PluginLibrary::open(&path).unwrap();
    println!("backend: {:?}", plugin.kind());
    match plugin.get_ptr(&symbol).unwrap() {
        Some(addr) => println!("{symbol} -> {addr:p}"),
        None => println!("{symbol} is not exported"),
    }
    println!(
        "safety: {:?}, can unload: {}",
        plugin.safety_status(),
        plugin.can_unload()
    );
    match plugin.close() {
        Ok(()) => println!("closed"),
        Err(err) => println!("{err}"),
    }
}
