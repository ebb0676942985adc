fn main() -> anyhow::Result<()> {
    laundry_admin_lib::run(std::env::args().skip(1).collect())
}
