use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use wavepress_diagrams::{
    DiagramPublisher, DiagramRenderer, DiagramRequest, DocumentOutcome, PlaceholderRenderer,
    PublishError, PublisherConfig, ReferenceTemplate, RendererError, XML_DECLARATION,
};

const DEMO: &str = "# Demo

```wavedrom
{ signal: [{ name: 'clk', wave: 'p.....' }] }
```

Some text.

```wavedrom
{ signal: [{ name: 'a', wave: '01.0' }, { name: 'b', wave: '0.10' }] }
```
";

/// Renderer recording the titles it was asked for.
struct RecordingRenderer {
    titles: Rc<RefCell<Vec<String>>>,
    available: bool,
}

impl DiagramRenderer for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn check_available(&self) -> Result<(), RendererError> {
        if self.available {
            Ok(())
        } else {
            Err(RendererError::Unavailable("backend offline".to_owned()))
        }
    }

    fn render(&self, request: &DiagramRequest<'_>) -> Result<String, RendererError> {
        self.titles.borrow_mut().push(request.title.clone());
        Ok(format!(
            "<svg><title>{}</title><g data-signals=\"{}\"/></svg>",
            request.title,
            request.description.signal_count()
        ))
    }
}

struct Fixture {
    _temp_dir: tempfile::TempDir,
    docs: PathBuf,
    titles: Rc<RefCell<Vec<String>>>,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let docs = temp_dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        Self {
            _temp_dir: temp_dir,
            docs,
            titles: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.docs.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn images(&self) -> PathBuf {
        self.docs.join("wavedrom-images")
    }

    fn publisher(&self, available: bool) -> DiagramPublisher {
        DiagramPublisher::new(
            self.config(),
            Box::new(RecordingRenderer {
                titles: Rc::clone(&self.titles),
                available,
            }),
        )
    }

    fn config(&self) -> PublisherConfig {
        PublisherConfig {
            image_dir: "wavedrom-images".to_owned(),
            reference: ReferenceTemplate::default(),
        }
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn reference(file: &str) -> String {
    format!(
        "\n\n**Rendered Diagram** (GitHub):\n\n![WaveDrom Diagram](./wavedrom-images/{file})\n\n"
    )
}

#[test]
fn test_demo_document_two_diagrams() {
    let fixture = Fixture::new();
    let doc = fixture.write("DEMO.md", DEMO);

    let summary = fixture.publisher(true).run(std::slice::from_ref(&doc));

    assert_eq!(summary.images_generated(), 2);
    assert_eq!(summary.documents_updated(), 1);

    let first = read(&fixture.images().join("DEMO-diagram-1.svg"));
    let second = read(&fixture.images().join("DEMO-diagram-2.svg"));
    assert!(first.starts_with(XML_DECLARATION));
    assert!(first.contains("DEMO - Diagram 1"));
    assert!(second.contains("data-signals=\"2\""));

    let expected = DEMO
        .replacen(
            "'p.....' }] }\n```",
            &format!("'p.....' }}] }}\n```{}", reference("DEMO-diagram-1.svg")),
            1,
        )
        .replacen(
            "'0.10' }] }\n```",
            &format!("'0.10' }}] }}\n```{}", reference("DEMO-diagram-2.svg")),
            1,
        );
    assert_eq!(read(&doc), expected);
    assert_eq!(
        *fixture.titles.borrow(),
        vec!["DEMO - Diagram 1".to_owned(), "DEMO - Diagram 2".to_owned()]
    );
}

#[test]
fn test_document_without_blocks_is_untouched() {
    let fixture = Fixture::new();
    let content = "# Notes\n\n```rust\nfn main() {}\n```\n";
    let doc = fixture.write("NOTES.md", content);

    let summary = fixture.publisher(true).run(&[doc.clone()]);

    assert_eq!(summary.images_generated(), 0);
    assert_eq!(summary.documents_updated(), 0);
    assert_eq!(read(&doc), content);
    assert!(!fixture.images().exists());
}

#[test]
fn test_rerun_does_not_duplicate_references() {
    let fixture = Fixture::new();
    let doc = fixture.write("DEMO.md", DEMO);
    let publisher = fixture.publisher(true);

    publisher.run(&[doc.clone()]);
    let after_first = read(&doc);
    let summary = publisher.run(&[doc.clone()]);

    assert_eq!(read(&doc), after_first);
    assert_eq!(summary.images_generated(), 2);
    assert_eq!(summary.documents_updated(), 0);
    assert_eq!(after_first.matches("![WaveDrom Diagram]").count(), 2);
}

#[test]
fn test_invalid_payload_skipped_siblings_processed() {
    let fixture = Fixture::new();
    let content = "```wavedrom\n{ signal: [] }\n```\n\n```wavedrom\n{ signal: [ oops\n```\n\n```wavedrom\n{ signal: [{}] }\n```\n";
    let doc = fixture.write("MIXED.md", content);

    let summary = fixture.publisher(true).run(&[doc.clone()]);

    assert_eq!(summary.images_generated(), 2);
    assert_eq!(summary.block_failures(), 1);
    assert!(fixture.images().join("MIXED-diagram-1.svg").exists());
    assert!(!fixture.images().join("MIXED-diagram-2.svg").exists());
    assert!(fixture.images().join("MIXED-diagram-3.svg").exists());

    let updated = read(&doc);
    assert!(updated.contains("./wavedrom-images/MIXED-diagram-1.svg"));
    assert!(!updated.contains("MIXED-diagram-2.svg"));
    assert!(updated.contains("./wavedrom-images/MIXED-diagram-3.svg"));

    match &summary.outcomes[0] {
        DocumentOutcome::Processed(report) => {
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].number, 2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_missing_dependency_creates_nothing() {
    let fixture = Fixture::new();
    let doc = fixture.write("DEMO.md", DEMO);
    let publisher = fixture.publisher(false);

    let err = publisher.check_dependencies().unwrap_err();

    assert!(matches!(err, PublishError::MissingDependency { .. }));
    assert_eq!(read(&doc), DEMO);
    assert!(!fixture.images().exists());
    assert!(fixture.titles.borrow().is_empty());
}

#[test]
fn test_missing_file_skipped_others_processed() {
    let fixture = Fixture::new();
    let missing = fixture.docs.join("GONE.md");
    let doc = fixture.write("DEMO.md", DEMO);

    let summary = fixture.publisher(true).run(&[missing, doc]);

    assert!(matches!(summary.outcomes[0], DocumentOutcome::Skipped { .. }));
    assert!(matches!(summary.outcomes[1], DocumentOutcome::Processed(_)));
    assert_eq!(summary.images_generated(), 2);
}

#[test]
fn test_placeholder_renderer_adds_note() {
    let fixture = Fixture::new();
    let doc = fixture.write("DEMO.md", DEMO);
    let publisher = DiagramPublisher::new(fixture.config(), Box::new(PlaceholderRenderer::new()));

    publisher.run(&[doc.clone()]);

    let updated = read(&doc);
    assert_eq!(
        updated
            .matches("<sub>Click the image to open in WaveDrom Editor</sub>")
            .count(),
        2
    );
    assert!(read(&fixture.images().join("DEMO-diagram-1.svg")).contains("wavedrom.com/editor.html"));
}

#[test]
fn test_document_name_with_inner_dots() {
    let fixture = Fixture::new();
    let doc = fixture.write("v1.2.notes.md", "```wavedrom\n{}\n```\n");

    fixture.publisher(true).run(&[doc]);

    assert!(fixture.images().join("v1.2.notes-diagram-1.svg").exists());
}

#[test]
fn test_documents_in_subfolders_link_to_their_own_images() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.docs.join("a")).unwrap();
    fs::create_dir_all(fixture.docs.join("b")).unwrap();
    let first = fixture.write("a/X.md", "```wavedrom\n{ signal: [{ name: 'a' }] }\n```\n");
    let second = fixture.write("b/X.md", "```wavedrom\n{ signal: [{ name: 'b' }] }\n```\n");

    let summary = fixture.publisher(true).run(&[first.clone(), second.clone()]);

    assert_eq!(summary.images_generated(), 2);
    for (doc, folder) in [(&first, "a"), (&second, "b")] {
        assert!(read(doc).contains("](./wavedrom-images/X-diagram-1.svg)"));
        let image = doc.parent().unwrap().join("wavedrom-images/X-diagram-1.svg");
        assert!(image.exists(), "missing image for {folder}");
    }
    assert!(!fixture.images().exists());
    assert_eq!(
        *fixture.titles.borrow(),
        vec!["X - Diagram 1".to_owned(), "X - Diagram 1".to_owned()]
    );
}

#[test]
fn test_switching_backend_rewrites_reference() {
    let fixture = Fixture::new();
    let doc = fixture.write("DEMO.md", DEMO);

    fixture.publisher(true).run(std::slice::from_ref(&doc));
    let placeholder =
        DiagramPublisher::new(fixture.config(), Box::new(PlaceholderRenderer::new()));
    let summary = placeholder.run(std::slice::from_ref(&doc));
    let updated = read(&doc);

    assert_eq!(updated.matches("![WaveDrom Diagram]").count(), 2);
    assert_eq!(updated.matches("<sub>Click the image").count(), 2);
    match &summary.outcomes[0] {
        DocumentOutcome::Processed(report) => {
            assert_eq!(report.references_inserted, 0);
            assert_eq!(report.references_replaced, 2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    fixture.publisher(true).run(std::slice::from_ref(&doc));
    let back = read(&doc);
    assert_eq!(back.matches("![WaveDrom Diagram]").count(), 2);
    assert!(!back.contains("<sub>"));
}
