/// 查找表头行: 去掉逗号和首尾空白后第一条非空行, 返回 1-based 行号
pub fn locate_header<I, S>(lines: I) -> Option<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .position(|line| !line.as_ref().replace(',', "").trim().is_empty())
        .map(|idx| idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comma_only_preamble() {
        let lines = ["", " , ,,", "Destination,Numbering plan,Rates per minute", "Kenya,254,0.02"];
        assert_eq!(locate_header(lines), Some(3));
    }

    #[test]
    fn first_line_header() {
        assert_eq!(locate_header(["prefix,rate"]), Some(1));
    }

    #[test]
    fn nothing_content_bearing() {
        assert_eq!(locate_header([",,,", "", "   "]), None);
        assert_eq!(locate_header(Vec::<String>::new()), None);
    }
}
