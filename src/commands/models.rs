use console::style;

/// Known model identifiers and a one-line description of each. The catalog
/// is static; the remote API is not consulted.
const MODELS: &[(&str, &str)] = &[
    ("sonar", "Default, balanced speed and capability"),
    ("sonar-small", "Fastest, least capable"),
    ("sonar-medium", "Good balance of speed and capability"),
    ("sonar-large", "Most capable, slower"),
    ("codellama-70b", "Specialized for code generation"),
    ("mistral-7b", "Open-source model"),
    ("mixtral-8x7b", "Mixture of experts model"),
    ("llama-3-70b", "Meta's latest model"),
];

pub fn models() {
    println!("{}", style("Available Perplexity Models:").cyan());
    for (name, description) in MODELS {
        println!(
            "{} {}",
            style(format!("- {name}")).yellow(),
            style(format!("({description})")).dim()
        );
    }
    println!(
        "\n{}",
        style("Use with: plexi query \"Your question\" --model model-name").dim()
    );
}
