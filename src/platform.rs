//! Platform tag tables for the web backing tree.
//!
//! These are the defaults behind the function pointers in
//! [`Config`](crate::config::Config). A host targeting a different
//! element vocabulary swaps them out through `update_config`.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::config;
use crate::types::Namespace;

const HTML_TAGS: &str = "html,body,base,head,link,meta,style,title,\
address,article,aside,footer,header,h1,h2,h3,h4,h5,h6,hgroup,nav,section,\
div,dd,dl,dt,figcaption,figure,picture,hr,img,li,main,ol,p,pre,ul,\
a,b,abbr,bdi,bdo,br,cite,code,data,dfn,em,i,kbd,mark,q,rp,rt,rtc,ruby,\
s,samp,small,span,strong,sub,sup,time,u,var,wbr,area,audio,map,track,video,\
embed,object,param,source,canvas,script,noscript,del,ins,\
caption,col,colgroup,table,thead,tbody,td,th,tr,\
button,datalist,fieldset,form,input,label,legend,meter,optgroup,option,\
output,progress,select,textarea,\
details,dialog,menu,menuitem,summary,\
content,element,shadow,template,blockquote,iframe,tfoot";

// `foreignObject` keeps its case; everything else is lowercase in the tree.
const SVG_TAGS: &str = "svg,animate,circle,clippath,cursor,defs,desc,ellipse,filter,font-face,\
foreignObject,g,glyph,image,line,marker,mask,missing-glyph,path,pattern,\
polygon,polyline,rect,switch,symbol,text,textpath,tspan,use,view";

fn html_tags() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| HTML_TAGS.split(',').collect())
}

fn svg_tags() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| SVG_TAGS.split(',').collect())
}

pub fn is_html_tag(tag: &str) -> bool {
    html_tags().contains(tag)
}

pub fn is_svg_tag(tag: &str) -> bool {
    svg_tags().contains(tag)
}

/// Built-in abstract tags that can never be component names.
pub fn is_built_in_tag(tag: &str) -> bool {
    matches!(tag, "slot" | "component")
}

/// HTML or SVG element known to the platform.
pub fn is_reserved_tag(tag: &str) -> bool {
    is_html_tag(tag) || is_svg_tag(tag)
}

/// Namespace a tag creates when no ancestor supplies one.
pub fn get_tag_namespace(tag: &str) -> Option<Namespace> {
    if is_svg_tag(tag) {
        Some(Namespace::Svg)
    } else if tag == "math" {
        Some(Namespace::MathMl)
    } else {
        None
    }
}

/// An element name the platform does not know.
///
/// Hyphenated names are custom elements and count as known.
pub fn is_unknown_element(tag: &str) -> bool {
    let lower = tag.to_ascii_lowercase();
    if is_reserved_tag(&lower) || is_reserved_tag(tag) {
        return false;
    }
    !lower.contains('-')
}

/// Map a tag to the name handed to the backing tree.
pub fn parse_platform_tag_name(tag: &str) -> String {
    tag.to_string()
}

/// Whether a tag is listed in `Config::ignored_elements`.
pub fn is_ignored_element(tag: &str) -> bool {
    config::with_config(|c| c.ignored_elements.iter().any(|ignored| ignored == tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_tags() {
        assert!(is_reserved_tag("div"));
        assert!(is_reserved_tag("svg"));
        assert!(is_reserved_tag("foreignObject"));
        assert!(!is_reserved_tag("my-widget"));
        assert!(!is_reserved_tag("Widget"));
    }

    #[test]
    fn test_tag_namespace() {
        assert_eq!(get_tag_namespace("svg"), Some(Namespace::Svg));
        assert_eq!(get_tag_namespace("circle"), Some(Namespace::Svg));
        assert_eq!(get_tag_namespace("math"), Some(Namespace::MathMl));
        assert_eq!(get_tag_namespace("div"), None);
    }

    #[test]
    fn test_unknown_element() {
        assert!(is_unknown_element("blorp"));
        assert!(!is_unknown_element("x-blorp"));
        assert!(!is_unknown_element("span"));
    }
}
