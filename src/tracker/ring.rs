/// 固定長リングバッファ
///
/// 書き込み位置は push のたびに容量で折り返す。満杯後は最古のスロットを
/// 上書きし、追い出した値を返す（移動平均の差分更新に使う）。
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    slots: Vec<Option<T>>,
    /// 次に書き込むスロット
    cursor: usize,
    len: usize,
}

impl<T> CircularBuffer<T> {
    /// 容量0は1に切り上げる
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            cursor: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 次の push で追い出される値（未充填なら None）
    pub fn peek_evicted(&self) -> Option<&T> {
        self.slots[self.cursor].as_ref()
    }

    /// 値を書き込み、追い出された値を返す
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = self.slots[self.cursor].replace(value);
        self.cursor = (self.cursor + 1) % self.capacity();
        if evicted.is_none() {
            self.len += 1;
        }
        evicted
    }

    /// 古い順に走査
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let start = if self.is_full() { self.cursor } else { 0 };
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.slots[(start + i) % cap].as_ref())
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.cursor = 0;
        self.len = 0;
    }
}
