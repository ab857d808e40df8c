mod command;
mod schema;
mod setup;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
