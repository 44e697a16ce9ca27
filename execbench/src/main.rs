fn main() -> anyhow::Result<()> {
    execbench::run()
}
