use jstubs_api::Coordinate;
use std::fmt::Write;

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A throwaway POM whose only purpose is to declare `coordinates` as
/// dependencies so Maven computes their classpath.
pub fn render_pom(coordinates: &[Coordinate]) -> String {
    let mut out = String::new();
    out.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n\
         \x20 <modelVersion>4.0.0</modelVersion>\n\
         \x20 <groupId>jstubs.resolve</groupId>\n\
         \x20 <artifactId>jstubs-resolve</artifactId>\n\
         \x20 <version>0</version>\n\
         \x20 <packaging>pom</packaging>\n\
         \x20 <dependencies>\n",
    );
    for coordinate in coordinates {
        out.push_str("    <dependency>\n");
        let _ = writeln!(out, "      <groupId>{}</groupId>", escape(coordinate.group()));
        let _ = writeln!(
            out,
            "      <artifactId>{}</artifactId>",
            escape(coordinate.artifact())
        );
        let _ = writeln!(out, "      <version>{}</version>", escape(coordinate.version()));
        if let Some(classifier) = coordinate.as_str().split(':').nth(3) {
            let _ = writeln!(out, "      <classifier>{}</classifier>", escape(classifier));
        }
        out.push_str("    </dependency>\n");
    }
    out.push_str("  </dependencies>\n</project>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pom() {
        let coordinates = vec![
            Coordinate::parse("org.example:lib:1.0.0").unwrap(),
            Coordinate::parse("org.scijava:native-lib-loader:2.4.0:natives").unwrap(),
        ];
        let pom = render_pom(&coordinates);

        assert!(pom.contains("<modelVersion>4.0.0</modelVersion>"));
        assert!(pom.contains("<artifactId>lib</artifactId>"));
        assert!(pom.contains("<version>1.0.0</version>"));
        assert!(pom.contains("<classifier>natives</classifier>"));
        assert_eq!(pom.matches("<dependency>").count(), 2);
    }
}
