//! WordprocessingML markup for newly inserted blocks.

use std::borrow::Cow;

use quick_xml::escape::escape;

use super::block::{ParagraphStyle, column_count, normalize_rows};

const CODE_FONT: &str = "Consolas";
/// Half-points, i.e. 9pt.
const CODE_FONT_SIZE: u32 = 18;
pub(crate) const EMU_PER_INCH: f64 = 914_400.0;

const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Emits elements qualified with the document's own namespace prefix.
#[derive(Debug, Clone)]
pub(crate) struct Markup {
    prefix: Option<String>,
}

/// Placement of an embedded picture.
#[derive(Debug, Clone)]
pub(crate) struct PictureRef<'a> {
    pub relationship_id: &'a str,
    pub drawing_id: u32,
    pub name: &'a str,
    pub width_emu: u64,
    pub height_emu: u64,
}

impl Markup {
    pub(crate) fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    fn q(&self, local: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    pub(crate) fn paragraph(&self, text: &str, style: ParagraphStyle) -> String {
        let (p, ppr, r) = (self.q("p"), self.q("pPr"), self.q("r"));
        let properties = match style {
            ParagraphStyle::Body => String::new(),
            ParagraphStyle::Code => format!(
                "<{ppr}><{spacing} {before}=\"0\" {after}=\"0\"/></{ppr}>",
                spacing = self.q("spacing"),
                before = self.q("before"),
                after = self.q("after"),
            ),
        };
        let run_properties = match style {
            ParagraphStyle::Body => String::new(),
            ParagraphStyle::Code => self.code_run_properties(),
        };

        let mut runs = String::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                runs.push_str(&format!("<{}/>", self.q("br")));
            }
            runs.push_str(&self.text_element(line));
        }

        format!("<{p}>{properties}<{r}>{run_properties}{runs}</{r}></{p}>")
    }

    pub(crate) fn table(&self, headers: Option<&[String]>, rows: &[Vec<String>]) -> String {
        let columns = column_count(headers, rows);
        let (tbl, tr) = (self.q("tbl"), self.q("tr"));

        let mut xml = format!("<{tbl}>{}{}", self.table_properties(), self.table_grid(columns));
        if let Some(headers) = headers {
            let header_row = normalize_rows(&[headers.to_vec()], columns);
            xml.push_str(&format!("<{tr}>"));
            for cell in &header_row[0] {
                xml.push_str(&self.table_cell(cell, true));
            }
            xml.push_str(&format!("</{tr}>"));
        }
        for row in normalize_rows(rows, columns) {
            xml.push_str(&format!("<{tr}>"));
            for cell in &row {
                xml.push_str(&self.table_cell(cell, false));
            }
            xml.push_str(&format!("</{tr}>"));
        }
        xml.push_str(&format!("</{tbl}>"));
        xml
    }

    pub(crate) fn picture(&self, picture: &PictureRef<'_>) -> String {
        let (p, r, drawing) = (self.q("p"), self.q("r"), self.q("drawing"));
        let PictureRef { relationship_id, drawing_id, name, width_emu: cx, height_emu: cy } =
            picture;
        let name = escape(xml_safe(name));
        format!(
            concat!(
                "<{p}><{r}><{drawing}>",
                "<wp:inline xmlns:wp=\"{ns_wp}\" distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
                "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
                "<wp:docPr id=\"{id}\" name=\"Picture {id}\"/>",
                "<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a=\"{ns_a}\" noChangeAspect=\"1\"/></wp:cNvGraphicFramePr>",
                "<a:graphic xmlns:a=\"{ns_a}\"><a:graphicData uri=\"{ns_pic}\">",
                "<pic:pic xmlns:pic=\"{ns_pic}\">",
                "<pic:nvPicPr><pic:cNvPr id=\"0\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
                "<pic:blipFill><a:blip xmlns:r=\"{ns_r}\" r:embed=\"{rid}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
                "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
                "</pic:pic></a:graphicData></a:graphic></wp:inline>",
                "</{drawing}></{r}></{p}>"
            ),
            p = p,
            r = r,
            drawing = drawing,
            ns_wp = NS_WP,
            ns_a = NS_A,
            ns_pic = NS_PIC,
            ns_r = NS_R,
            cx = cx,
            cy = cy,
            id = drawing_id,
            name = name,
            rid = relationship_id,
        )
    }

    fn text_element(&self, text: &str) -> String {
        let t = self.q("t");
        format!("<{t} xml:space=\"preserve\">{}</{t}>", escape(xml_safe(text)))
    }

    fn code_run_properties(&self) -> String {
        format!(
            "<{rpr}><{fonts} {ascii}=\"{font}\" {hansi}=\"{font}\" {east}=\"{font}\" {cs}=\"{font}\"/><{sz} {val}=\"{size}\"/></{rpr}>",
            rpr = self.q("rPr"),
            fonts = self.q("rFonts"),
            ascii = self.q("ascii"),
            hansi = self.q("hAnsi"),
            east = self.q("eastAsia"),
            cs = self.q("cs"),
            sz = self.q("sz"),
            val = self.q("val"),
            font = CODE_FONT,
            size = CODE_FONT_SIZE,
        )
    }

    fn table_properties(&self) -> String {
        let borders: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
            .iter()
            .map(|edge| {
                format!(
                    "<{edge} {val}=\"single\" {sz}=\"4\" {space}=\"0\" {color}=\"auto\"/>",
                    edge = self.q(edge),
                    val = self.q("val"),
                    sz = self.q("sz"),
                    space = self.q("space"),
                    color = self.q("color"),
                )
            })
            .collect();
        format!(
            "<{tblpr}><{tblw} {w}=\"0\" {ty}=\"auto\"/><{tblborders}>{borders}</{tblborders}></{tblpr}>",
            tblpr = self.q("tblPr"),
            tblw = self.q("tblW"),
            w = self.q("w"),
            ty = self.q("type"),
            tblborders = self.q("tblBorders"),
        )
    }

    fn table_grid(&self, columns: usize) -> String {
        let grid = self.q("tblGrid");
        let col = format!("<{}/>", self.q("gridCol"));
        format!("<{grid}>{}</{grid}>", col.repeat(columns))
    }

    fn table_cell(&self, text: &str, bold: bool) -> String {
        let (tc, p, r) = (self.q("tc"), self.q("p"), self.q("r"));
        let run_properties = if bold {
            format!("<{rpr}><{b}/></{rpr}>", rpr = self.q("rPr"), b = self.q("b"))
        } else {
            String::new()
        };
        format!(
            "<{tc}><{tcpr}><{tcw} {w}=\"0\" {ty}=\"auto\"/></{tcpr}><{p}><{r}>{run_properties}{}</{r}></{p}></{tc}>",
            self.text_element(text),
            tcpr = self.q("tcPr"),
            tcw = self.q("tcW"),
            w = self.q("w"),
            ty = self.q("type"),
        )
    }
}

/// `text` without the characters XML 1.0 cannot carry, such as terminal
/// escapes and NULs in captured program output.
fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
