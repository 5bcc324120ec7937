fn main() {
    shell_tauri::run();
}
