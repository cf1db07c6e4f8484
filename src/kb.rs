//! Built-in topic knowledge base.
//!
//! An ordered list of development topics with a definition and named
//! list-valued sections. Lookup is by case-insensitive substring containment
//! of the topic key in the question; the first match in insertion order
//! wins. Topics can be overridden by a `topics.yml` in the data dir.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSection {
    pub name: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub key: String,
    pub definition: String,
    #[serde(default)]
    pub sections: Vec<TopicSection>,
}

pub struct KnowledgeBase {
    topics: Vec<Topic>,
}

const SECTION_EMOJIS: &[(&str, &str)] = &[
    ("features", "✨"),
    ("uses", "🎯"),
    ("advantages", "👍"),
    ("types", "🔗"),
    ("commands", "💻"),
    ("concepts", "🧠"),
    ("frameworks", "🛠️"),
    ("methods", "🔧"),
    ("tags", "🏷️"),
    ("properties", "🎨"),
    ("modules", "📦"),
    ("workflows", "🔄"),
    ("benefits", "👍"),
    ("versions", "🔗"),
    ("preprocessors", "🛠️"),
];

impl KnowledgeBase {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    /// Load topics from a YAML file when present, built-ins otherwise.
    pub fn load(topics_path: &Path) -> Self {
        if let Ok(raw) = fs::read_to_string(topics_path) {
            match serde_yaml::from_str::<Vec<Topic>>(&raw) {
                Ok(topics) if !topics.is_empty() => return Self::new(topics),
                Ok(_) => tracing::warn!("{} is empty, using built-in topics", topics_path.display()),
                Err(err) => tracing::warn!(
                    "Invalid topics file {}: {}, using built-in topics",
                    topics_path.display(),
                    err
                ),
            }
        }
        Self::builtin()
    }

    pub fn topic_keys(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.key.as_str()).collect()
    }

    /// Find the first topic whose key is contained in the question
    /// (case-insensitive) and render it. `None` when nothing matches.
    pub fn lookup(&self, question: &str) -> Option<String> {
        let question_lower = question.to_lowercase();

        let topic = self
            .topics
            .iter()
            .find(|t| question_lower.contains(&t.key.to_lowercase()))?;

        Some(render_topic(topic))
    }

    /// Fixed fallback listing the available topics and example questions.
    pub fn fallback(&self, question: &str) -> String {
        let available = self.topic_keys().join(", ");

        format!(
            "🤔 No encontré información específica sobre \"{question}\".\n\n\
             📚 **Temas disponibles:** {available}\n\n\
             💡 **Ejemplos de preguntas:**\n\
             • \"¿Qué es React?\"\n\
             • \"Explícame JavaScript\"\n\
             • \"¿Cómo funciona una API?\"\n\
             • \"¿Qué es Python?\"\n\
             • \"Comandos de Git\"\n\
             • \"Características de Node.js\"\n\n\
             ¿Podrías preguntar sobre alguno de estos temas?"
        )
    }

    pub fn builtin() -> Self {
        Self::new(builtin_topics())
    }
}

fn render_topic(topic: &Topic) -> String {
    let mut out = format!("**{}:**\n\n", topic.key.to_uppercase());
    out.push_str(&format!("📝 **Definición:** {}\n\n", topic.definition));

    for section in &topic.sections {
        let emoji = SECTION_EMOJIS
            .iter()
            .find(|(name, _)| *name == section.name)
            .map(|(_, emoji)| *emoji)
            .unwrap_or("•");

        out.push_str(&format!("{} **{}:**\n", emoji, title_case(&section.name)));
        for item in &section.items {
            out.push_str(&format!("  • {}\n", item));
        }
        out.push('\n');
    }

    out
}

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn section(name: &str, items: &[&str]) -> TopicSection {
    TopicSection {
        name: name.to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

fn topic(key: &str, definition: &str, sections: Vec<TopicSection>) -> Topic {
    Topic {
        key: key.to_string(),
        definition: definition.to_string(),
        sections,
    }
}

fn builtin_topics() -> Vec<Topic> {
    vec![
        topic(
            "react",
            "React es una biblioteca de JavaScript desarrollada por Facebook para construir interfaces de usuario, especialmente para aplicaciones web de una sola página (SPA).",
            vec![
                section("features", &["Componentes reutilizables", "Virtual DOM", "JSX", "Hooks", "Unidirectional data flow"]),
                section("advantages", &["Rendimiento optimizado", "Ecosistema robusto", "Gran comunidad", "Fácil testing"]),
                section("concepts", &["State", "Props", "Components", "Lifecycle", "Context API"]),
            ],
        ),
        topic(
            "javascript",
            "JavaScript es un lenguaje de programación dinámico y versátil que se ejecuta tanto en navegadores como en servidores.",
            vec![
                section("features", &["Tipado dinámico", "Orientado a objetos", "Funcional", "Interpretado", "Event-driven"]),
                section("uses", &["Desarrollo web frontend", "Backend con Node.js", "Aplicaciones móviles", "Desktop apps"]),
                section("concepts", &["Variables", "Funciones", "Objetos", "Arrays", "Promises", "Async/Await"]),
            ],
        ),
        topic(
            "python",
            "Python es un lenguaje de programación de alto nivel, interpretado y de propósito general, conocido por su sintaxis clara y legible.",
            vec![
                section("features", &["Sintaxis simple", "Tipado dinámico", "Multiplataforma", "Orientado a objetos"]),
                section("uses", &["Desarrollo web", "Ciencia de datos", "Inteligencia artificial", "Automatización", "Scripting"]),
                section("frameworks", &["Django", "Flask", "FastAPI", "Pandas", "NumPy", "TensorFlow"]),
            ],
        ),
        topic(
            "api",
            "Una API (Application Programming Interface) es un conjunto de reglas y protocolos que permite que diferentes aplicaciones software se comuniquen entre sí.",
            vec![
                section("types", &["REST API", "GraphQL", "SOAP", "WebSocket"]),
                section("benefits", &["Reutilización de código", "Escalabilidad", "Separación de responsabilidades", "Integración"]),
                section("methods", &["GET", "POST", "PUT", "DELETE", "PATCH"]),
            ],
        ),
        topic(
            "html",
            "HTML (HyperText Markup Language) es el lenguaje de marcado estándar para crear páginas web.",
            vec![
                section("features", &["Elementos y etiquetas", "Estructura semántica", "Formularios", "Multimedia"]),
                section("versions", &["HTML5 es la versión actual", "Incluye APIs de JavaScript", "Soporte multimedia nativo"]),
                section("tags", &["div", "span", "header", "footer", "nav", "section", "article"]),
            ],
        ),
        topic(
            "css",
            "CSS (Cascading Style Sheets) es un lenguaje de hojas de estilo usado para describir la presentación de documentos HTML.",
            vec![
                section("features", &["Selectores", "Propiedades", "Flexbox", "Grid", "Animaciones", "Media queries"]),
                section("preprocessors", &["Sass", "Less", "Stylus"]),
                section("properties", &["color", "font-size", "margin", "padding", "display", "position"]),
            ],
        ),
        topic(
            "node",
            "Node.js es un entorno de ejecución de JavaScript construido sobre el motor V8 de Chrome que permite ejecutar JavaScript en el servidor.",
            vec![
                section("features", &["Event-driven", "Non-blocking I/O", "NPM package manager", "Cross-platform"]),
                section("uses", &["APIs REST", "Aplicaciones en tiempo real", "Microservicios", "Herramientas de build"]),
                section("modules", &["Express.js", "Socket.io", "Mongoose", "Lodash"]),
            ],
        ),
        topic(
            "git",
            "Git es un sistema de control de versiones distribuido que rastrea cambios en archivos y coordina el trabajo entre múltiples desarrolladores.",
            vec![
                section("commands", &["git clone", "git add", "git commit", "git push", "git pull", "git branch"]),
                section("concepts", &["Repository", "Branch", "Merge", "Pull request", "Conflict resolution"]),
                section("workflows", &["Feature branch", "Gitflow", "GitHub flow"]),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_substring() {
        let kb = KnowledgeBase::builtin();

        let response = kb.lookup("¿Qué es REACT?").unwrap();
        assert!(response.contains("**REACT:**"));
        assert!(response.contains("biblioteca de JavaScript"));
        assert!(response.contains("✨ **Features:**"));
        assert!(response.contains("  • Virtual DOM"));
    }

    #[test]
    fn first_match_in_insertion_order_wins() {
        let kb = KnowledgeBase::builtin();

        // "react" precedes "javascript" in the topic list.
        let response = kb.lookup("react o javascript?").unwrap();
        assert!(response.starts_with("**REACT:**"));
    }

    #[test]
    fn every_topic_response_contains_its_definition() {
        let kb = KnowledgeBase::builtin();

        for key in kb.topic_keys() {
            let response = kb.lookup(&format!("háblame de {}", key)).unwrap();
            assert!(!response.is_empty());
            assert!(response.contains("**Definición:**"), "topic {}", key);
        }
    }

    #[test]
    fn no_match_returns_none_and_fallback_lists_topics() {
        let kb = KnowledgeBase::builtin();

        assert!(kb.lookup("cuéntame del clima").is_none());

        let fallback = kb.fallback("cuéntame del clima");
        assert!(fallback.contains("cuéntame del clima"));
        for key in kb.topic_keys() {
            assert!(fallback.contains(key));
        }
    }

    #[test]
    fn loads_topics_from_yaml_override() {
        let tmp = std::env::temp_dir().join(format!("sabio-topics-{}.yml", uuid::Uuid::new_v4()));
        std::fs::write(
            &tmp,
            "- key: rust\n  definition: Lenguaje de sistemas.\n  sections:\n    - name: features\n      items: [\"Ownership\", \"Borrowing\"]\n",
        )
        .unwrap();

        let kb = KnowledgeBase::load(&tmp);
        assert_eq!(kb.topic_keys(), vec!["rust"]);
        let response = kb.lookup("que es rust").unwrap();
        assert!(response.contains("Ownership"));

        let _ = std::fs::remove_file(tmp);
    }

    #[test]
    fn missing_topics_file_uses_builtins() {
        let kb = KnowledgeBase::load(Path::new("/nonexistent/topics.yml"));
        assert_eq!(kb.topic_keys().len(), 8);
    }

    #[test]
    fn unknown_section_gets_bullet_prefix() {
        let t = topic(
            "demo",
            "Una demo.",
            vec![section("extras", &["uno"])],
        );
        let rendered = render_topic(&t);
        assert!(rendered.contains("• **Extras:**"));
    }
}
